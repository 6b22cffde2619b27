//! Operations addressable by name.
//!
//! Callers that receive an operation as a string (a CLI verb, a queued job)
//! parse it into an [`Operation`] and hand it to [`Domains::dispatch`].
//! Names match exactly and case-sensitively; `list` is accepted as an alias
//! of `getList`.

use std::str::FromStr;

use arsys_error::RegistrarError;
use serde_json::Value;

use super::types::OperationOutput;
use super::Domains;
use crate::contact::ContactRole;
use crate::params::{validate, Args, FieldType, ParamSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Check,
    CheckForTransfer,
    Create,
    Transfer,
    TransferRestart,
    UpdateContacts,
    UpdateNameServers,
    UpdateLockedDomain,
    AssignContact,
    CreateDnsServer,
    GlueRecordCreate,
    GlueRecordUpdate,
    GlueRecordDelete,
    GetList,
    GetInfo,
    DomainSuggests,
    GetAuthCode,
    GetNameServers,
    GetGlueRecords,
    GetDnsSec,
    DnsSecCreate,
    DnsSecDelete,
    Renew,
    Whois,
    ResendVerificationMail,
    ResendFoaMail,
    ResetFoa,
    GetHistory,
    ListDeleted,
}

impl Operation {
    pub const ALL: [Operation; 29] = [
        Self::Check,
        Self::CheckForTransfer,
        Self::Create,
        Self::Transfer,
        Self::TransferRestart,
        Self::UpdateContacts,
        Self::UpdateNameServers,
        Self::UpdateLockedDomain,
        Self::AssignContact,
        Self::CreateDnsServer,
        Self::GlueRecordCreate,
        Self::GlueRecordUpdate,
        Self::GlueRecordDelete,
        Self::GetList,
        Self::GetInfo,
        Self::DomainSuggests,
        Self::GetAuthCode,
        Self::GetNameServers,
        Self::GetGlueRecords,
        Self::GetDnsSec,
        Self::DnsSecCreate,
        Self::DnsSecDelete,
        Self::Renew,
        Self::Whois,
        Self::ResendVerificationMail,
        Self::ResendFoaMail,
        Self::ResetFoa,
        Self::GetHistory,
        Self::ListDeleted,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::CheckForTransfer => "checkForTransfer",
            Self::Create => "create",
            Self::Transfer => "transfer",
            Self::TransferRestart => "transferRestart",
            Self::UpdateContacts => "updateContacts",
            Self::UpdateNameServers => "updateNameServers",
            Self::UpdateLockedDomain => "updateLockedDomain",
            Self::AssignContact => "assignContact",
            Self::CreateDnsServer => "createDnsServer",
            Self::GlueRecordCreate => "glueRecordCreate",
            Self::GlueRecordUpdate => "glueRecordUpdate",
            Self::GlueRecordDelete => "glueRecordDelete",
            Self::GetList => "getList",
            Self::GetInfo => "getInfo",
            Self::DomainSuggests => "domainSuggests",
            Self::GetAuthCode => "getAuthCode",
            Self::GetNameServers => "getNameServers",
            Self::GetGlueRecords => "getGlueRecords",
            Self::GetDnsSec => "getDnsSec",
            Self::DnsSecCreate => "dnsSecCreate",
            Self::DnsSecDelete => "dnsSecDelete",
            Self::Renew => "renew",
            Self::Whois => "whois",
            Self::ResendVerificationMail => "resendVerificationMail",
            Self::ResendFoaMail => "resendFOAMail",
            Self::ResetFoa => "resetFOA",
            Self::GetHistory => "getHistory",
            Self::ListDeleted => "listDeleted",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = RegistrarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "list" {
            return Ok(Self::GetList);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.name() == s)
            .ok_or_else(|| RegistrarError::Config(format!("unknown operation '{}'", s)))
    }
}

const LOCK_ROWS: [ParamSpec; 1] = [ParamSpec::required("lock", FieldType::Boolean)];

const ROLE_NAMES: &[&str] = &["owner", "admin", "tech", "billing"];
const ROLE_ROWS: [ParamSpec; 1] = [ParamSpec::required("role", FieldType::OneOf(ROLE_NAMES))];

const DNS_SERVER_ROWS: [ParamSpec; 1] = [ParamSpec::optional("server_ip", FieldType::Text)];

impl Domains {
    /// Run `op` against `domain` with loose `args`.
    ///
    /// Operations that take no domain (`getList`, `listDeleted`) ignore it;
    /// `domainSuggests` reads it as the label to suggest around and
    /// `createDnsServer` as the nameserver host.
    pub async fn dispatch(
        &self,
        op: Operation,
        domain: &str,
        args: &Args,
    ) -> Result<OperationOutput, RegistrarError> {
        let envelope = match op {
            Operation::Check => self.check(domain).await?,
            Operation::CheckForTransfer => self.check_for_transfer(domain).await?,
            Operation::Create => self.create(domain, args).await?,
            Operation::Transfer => self.transfer(domain, args).await?,
            Operation::TransferRestart => self.transfer_restart(domain, args).await?,
            Operation::UpdateContacts => self.update_contacts(domain, args).await?,
            Operation::UpdateNameServers => {
                self.update_name_servers(domain, &positional_hosts(args.get("nameservers")))
                    .await?
            }
            Operation::UpdateLockedDomain => {
                let params = validate(&LOCK_ROWS, args)?;
                let lock = params.get("lock").and_then(Value::as_bool).unwrap_or(false);
                self.update_locked_domain(domain, lock).await?
            }
            Operation::AssignContact => {
                let params = validate(&ROLE_ROWS, args)?;
                let role = match params.get("role").and_then(Value::as_str) {
                    Some("owner") => ContactRole::Owner,
                    Some("admin") => ContactRole::Admin,
                    Some("tech") => ContactRole::Tech,
                    _ => ContactRole::Billing,
                };
                self.assign_contact(domain, role, args).await?
            }
            Operation::CreateDnsServer => {
                let params = validate(&DNS_SERVER_ROWS, args)?;
                let ip = params.get("server_ip").and_then(Value::as_str);
                self.create_dns_server(domain, ip).await?
            }
            Operation::GlueRecordCreate => self.glue_record_create(domain, args).await?,
            Operation::GlueRecordUpdate => self.glue_record_update(domain, args).await?,
            Operation::GlueRecordDelete => self.glue_record_delete(domain, args).await?,
            Operation::GetList => self.list(args).await?,
            Operation::GetInfo => self.get_info(domain, args).await?,
            Operation::DomainSuggests => self.suggest(domain).await?,
            Operation::GetAuthCode => self.get_auth_code(domain).await?,
            Operation::GetNameServers => {
                return Ok(OperationOutput::Nameservers(self.get_name_servers(domain).await?));
            }
            Operation::GetGlueRecords => self.get_glue_records(domain).await?,
            Operation::GetDnsSec => self.get_dnssec(domain).await?,
            Operation::DnsSecCreate => self.dnssec_create(domain, args).await?,
            Operation::DnsSecDelete => self.dnssec_delete(domain, args).await?,
            Operation::Renew => self.renew(domain, args).await?,
            Operation::Whois => self.whois(domain).await?,
            Operation::ResendVerificationMail => self.resend_verification_mail(domain).await?,
            Operation::ResendFoaMail => self.resend_foa_mail(domain).await?,
            Operation::ResetFoa => self.reset_foa(domain).await?,
            Operation::GetHistory => self.history(domain, args).await?,
            Operation::ListDeleted => self.list_deleted(args).await?,
        };
        Ok(OperationOutput::Envelope(envelope))
    }

    /// Parse `name` and dispatch it.
    pub async fn dispatch_named(
        &self,
        name: &str,
        domain: &str,
        args: &Args,
    ) -> Result<OperationOutput, RegistrarError> {
        let op: Operation = name.parse()?;
        self.dispatch(op, domain, args).await
    }
}

/// Hosts by position: an array keeps blanks in place, a string is split on
/// commas.
fn positional_hosts(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().unwrap_or_default().to_string())
            .collect(),
        Some(Value::String(list)) => list.split(',').map(|host| host.trim().to_string()).collect(),
        _ => Vec::new(),
    }
}
