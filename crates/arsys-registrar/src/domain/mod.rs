//! Domain lifecycle operations.
//!
//! [`Domains`] wraps an [`ApiClient`] with the multi-step workflows the
//! provider needs: registrations and transfers first create the contact and
//! nameserver resources they reference, then issue the primary call with the
//! collected codes.
//!
//! Every workflow is a straight, fail-fast sequence. Sub-calls are awaited
//! one at a time, the first failure aborts the rest, and resources created
//! before the failure are left in place on the provider side.

pub mod calls;
pub mod operation;
pub mod types;

use arsys_error::RegistrarError;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::cache::ReadThroughCache;
use crate::client::ApiClient;
use crate::config::{ClientOptions, Credentials};
use crate::contact::{contact_spec, flatten_contacts, has_block, ContactDescriptor, ContactRole};
use crate::params::{
    coerce, path_segment, validate, Args, FieldType, ParamSpec, RequestParams, DOMAIN, DOMAIN_ID,
};
use crate::resolver::{HostResolver, SystemResolver};
use crate::response::Envelope;
use crate::transport::Method;

pub use operation::Operation;
pub use types::{DomainRef, InfoType, OperationOutput, ProvisionedCodes, INFO_TYPES};

/// Slots available in a nameserver update: primary, secondary and three
/// additional servers.
pub const MAX_NAME_SERVERS: usize = 5;

pub const MIN_RENEW_PERIOD: i64 = 1;
pub const MAX_RENEW_PERIOD: i64 = 6;

/// Registration length sent with every create call.
const CREATE_DURATION: &str = "1";

const PROVISIONING_ROWS: [ParamSpec; 5] = [
    ParamSpec::required("domain", FieldType::DomainName),
    ParamSpec::optional("period", FieldType::Integer),
    ParamSpec::optional("premium", FieldType::Boolean),
    ParamSpec::optional("nameservers", FieldType::Text),
    ParamSpec::optional("authcode", FieldType::Text),
];

const INFO_ROWS: [ParamSpec; 3] = [
    DOMAIN,
    DOMAIN_ID,
    ParamSpec::optional("infoType", FieldType::OneOf(INFO_TYPES)),
];

pub struct Domains {
    client: ApiClient,
    resolver: Box<dyn HostResolver>,
    domain_info: ReadThroughCache<DomainRef, Envelope>,
    name_servers: ReadThroughCache<String, Envelope>,
    contacts: ReadThroughCache<String, Envelope>,
}

impl Domains {
    pub fn new(client: ApiClient, resolver: Box<dyn HostResolver>) -> Self {
        Self {
            client,
            resolver,
            domain_info: ReadThroughCache::new(),
            name_servers: ReadThroughCache::new(),
            contacts: ReadThroughCache::new(),
        }
    }

    /// HTTP client plus system DNS resolver.
    pub fn connect(options: ClientOptions, credentials: Credentials) -> Result<Self, RegistrarError> {
        let client = ApiClient::connect(options, credentials)?;
        let resolver = SystemResolver::from_system_conf()?;
        Ok(Self::new(client, Box::new(resolver)))
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Drop every cached domain, contact and nameserver envelope.
    pub async fn clear_caches(&self) {
        self.domain_info.clear().await;
        self.name_servers.clear().await;
        self.contacts.clear().await;
    }

    /// Register `domain`, creating its contacts and nameservers first.
    pub async fn create(&self, domain: &str, args: &Args) -> Result<Envelope, RegistrarError> {
        let params = provisioning_params(domain, args)?;
        let codes = self.provision("create", &params).await?;

        let mut body = RequestParams::new();
        body.insert("domain".into(), text_param(&params, "domain").into());
        body.insert("duration".into(), CREATE_DURATION.into());
        body.extend(codes.to_params());

        info!(domain, "registering domain");
        let envelope = self.client.execute("domains_v2", body, Method::Post).await?;
        if envelope.is_internal_error() {
            warn!(domain, "registration rejected");
            return Err(RegistrarError::workflow("create", "domain registration failed"));
        }
        Ok(envelope)
    }

    /// Transfer `domain` in, with the same contact and nameserver pipeline as
    /// [`Domains::create`].
    pub async fn transfer(&self, domain: &str, args: &Args) -> Result<Envelope, RegistrarError> {
        let params = provisioning_params(domain, args)?;
        let codes = self.provision("transfer", &params).await?;

        let mut body = codes.to_params();
        if let Some(authcode) = params.get("authcode") {
            body.insert("authcode".into(), authcode.clone());
        }

        let path = format!("domains/{}/transfer_v2", text_param(&params, "domain"));
        info!(domain, "requesting transfer");
        self.client.execute(&path, body, Method::Post).await
    }

    /// Create the owner, admin and tech contacts and the nameservers named in
    /// `params`, in that order.
    async fn provision(
        &self,
        stage: &str,
        params: &RequestParams,
    ) -> Result<ProvisionedCodes, RegistrarError> {
        let registrant_code = match self.role_code(stage, params, ContactRole::Owner).await? {
            Some(code) => code,
            None => {
                warn!(stage, "owner contact missing");
                return Err(RegistrarError::workflow(stage, "missing form data"));
            }
        };
        let admin_code = self
            .role_code(stage, params, ContactRole::Admin)
            .await?
            .unwrap_or_else(|| registrant_code.clone());
        let tech_code = self
            .role_code(stage, params, ContactRole::Tech)
            .await?
            .unwrap_or_else(|| admin_code.clone());

        let hosts: Vec<String> = params
            .get("nameservers")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .split(',')
            .map(|host| host.trim().to_string())
            .filter(|host| !host.is_empty())
            .collect();

        let mut servers_code = Vec::new();
        for host in &hosts {
            let envelope = self.create_dns_server(host, None).await?;
            match envelope.get_text("code") {
                Some(code) => servers_code.push(code),
                None => warn!(stage, host = host.as_str(), "nameserver returned no code"),
            }
        }
        if servers_code.is_empty() {
            warn!(stage, "no nameserver could be registered");
            return Err(RegistrarError::workflow(stage, "could not register nameservers"));
        }

        Ok(ProvisionedCodes {
            registrant_code,
            admin_code,
            tech_code,
            servers_code,
        })
    }

    /// Code for `role`: an existing `{role}ContactID`, else a freshly created
    /// contact when the caller supplied a block for it, else `None`.
    async fn role_code(
        &self,
        stage: &str,
        params: &RequestParams,
        role: ContactRole,
    ) -> Result<Option<String>, RegistrarError> {
        if let Some(id) = params
            .get(&format!("{}ContactID", role.prefix()))
            .and_then(Value::as_str)
        {
            return Ok(Some(id.to_string()));
        }
        if !has_block(params, role) {
            return Ok(None);
        }
        self.created_contact_code(stage, params, role).await.map(Some)
    }

    async fn created_contact_code(
        &self,
        stage: &str,
        params: &RequestParams,
        role: ContactRole,
    ) -> Result<String, RegistrarError> {
        info!(stage, %role, "creating contact");
        let envelope = self
            .create_contact(&ContactDescriptor::from_params(params, role))
            .await?;
        let code = envelope.get_text("code").filter(|_| envelope.is_usable());
        code.ok_or_else(|| {
            warn!(stage, %role, "contact creation failed");
            RegistrarError::workflow(
                stage,
                format!("missing form data: could not create the {} contact", role),
            )
        })
    }

    /// `POST contacts`.
    pub async fn create_contact(&self, descriptor: &ContactDescriptor) -> Result<Envelope, RegistrarError> {
        self.client
            .execute("contacts", descriptor.to_params(), Method::Post)
            .await
    }

    /// Memoized `GET contacts/{code}`.
    pub async fn get_contact(&self, code: &str) -> Result<Envelope, RegistrarError> {
        let code = path_segment("contact_code", code)?;
        let path = format!("contacts/{}", code);
        self.contacts
            .get_or_try_fetch(&code, || {
                self.client.execute(&path, RequestParams::new(), Method::Get)
            })
            .await
    }

    /// Register a nameserver host. Without an explicit address the host is
    /// looked up first.
    pub async fn create_dns_server(&self, host: &str, ip: Option<&str>) -> Result<Envelope, RegistrarError> {
        let name_row = ParamSpec::required("server_name", FieldType::DomainName);
        let server_name = coerce(&name_row, &Value::from(host.trim()))?;

        let server_ip = match ip.map(str::trim).filter(|ip| !ip.is_empty()) {
            Some(ip) => ip
                .parse::<std::net::IpAddr>()
                .map_err(|_| {
                    arsys_error::ValidationError::invalid("server_ip", format!("'{}' is not an IP address", ip))
                })?,
            None => self.resolver.resolve(host.trim()).await?,
        };

        let mut body = RequestParams::new();
        body.insert("server_name".into(), server_name);
        body.insert("server_ip".into(), Value::String(server_ip.to_string()));

        info!(host, ip = %server_ip, "registering nameserver");
        self.client.execute("dns", body, Method::Post).await
    }

    /// Replace the owner, admin and tech contacts of `domain`.
    ///
    /// Three contacts are always created, from whatever fields are present,
    /// even when the caller meant to keep some of them.
    pub async fn update_contacts(&self, domain: &str, args: &Args) -> Result<Envelope, RegistrarError> {
        let reference = DomainRef::resolve(domain)?;
        let spec = [&[DOMAIN, DOMAIN_ID][..], &contact_spec()[..]].concat();
        let params = validate(&spec, &merged(&reference, &flatten_contacts(args)))?;

        let owner = self.created_contact_code("updateContacts", &params, ContactRole::Owner).await?;
        let admin = self.created_contact_code("updateContacts", &params, ContactRole::Admin).await?;
        let tech = self.created_contact_code("updateContacts", &params, ContactRole::Tech).await?;

        let mut body = RequestParams::new();
        body.insert("domain".into(), reference.as_str().into());
        body.insert("registrant_code".into(), owner.into());
        body.insert("admin_code".into(), admin.into());
        body.insert("tech_code".into(), tech.into());

        self.client
            .execute(&domain_path(&reference, "data"), body, Method::Put)
            .await
    }

    /// Domain details, fetched once per reference.
    ///
    /// With `infoType: contact` the owner, admin and tech contacts are fetched
    /// (each once per code) and attached to the cached envelope as
    /// `contactOwner`, `contactAdmin` and `contactTech`.
    pub async fn get_info(&self, domain: &str, args: &Args) -> Result<Envelope, RegistrarError> {
        let reference = DomainRef::resolve(domain)?;
        let params = validate(&INFO_ROWS, &merged(&reference, args))?;
        let path = domain_path(&reference, "");

        let mut envelope = self
            .domain_info
            .get_or_try_fetch(&reference, || {
                self.client.execute(&path, params.clone(), Method::Get)
            })
            .await?;

        let info_type = params
            .get("infoType")
            .and_then(Value::as_str)
            .map(str::parse::<InfoType>)
            .transpose()?;

        if info_type == Some(InfoType::Contact) {
            for (slot, code_key) in [
                ("contactOwner", "registrant_code"),
                ("contactAdmin", "admin_code"),
                ("contactTech", "tech_code"),
            ] {
                let contact = match envelope.get_text(code_key) {
                    Some(code) => Value::Object(self.get_contact(&code).await?.into_payload()),
                    None => Value::Null,
                };
                envelope.set(slot, contact);
            }
            self.domain_info.insert(reference, envelope.clone()).await;
        }

        Ok(envelope)
    }

    /// Payloads of the nameservers assigned to `domain`, or `None` when it has
    /// none. Each nameserver is fetched once per code.
    pub async fn get_name_servers(
        &self,
        domain: &str,
    ) -> Result<Option<Vec<Map<String, Value>>>, RegistrarError> {
        let info = self.get_info(domain, &Args::new()).await?;
        let codes: Vec<String> = match info.get("dns_server_codes") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) if !s.is_empty() => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        if codes.is_empty() {
            return Ok(None);
        }

        let mut servers = Vec::with_capacity(codes.len());
        for code in codes {
            let code = path_segment("dns_server_code", &code)?;
            let path = format!("dns/{}", code);
            let envelope = self
                .name_servers
                .get_or_try_fetch(&code, || {
                    self.client.execute(&path, RequestParams::new(), Method::Get)
                })
                .await?;
            servers.push(envelope.into_payload());
        }
        Ok(Some(servers))
    }

    /// Point `domain` at up to five nameservers, by position.
    ///
    /// Each non-blank host is registered first. Slots 0 and 1 become the
    /// primary and secondary server codes (empty when blank); slots 2 to 4
    /// fill the additional list, skipping blanks. Hosts past the fifth are
    /// ignored.
    pub async fn update_name_servers(
        &self,
        domain: &str,
        nameservers: &[String],
    ) -> Result<Envelope, RegistrarError> {
        let reference = DomainRef::resolve(domain)?;
        if nameservers.len() > MAX_NAME_SERVERS {
            warn!(domain, count = nameservers.len(), "extra nameservers ignored");
        }

        let mut codes: Vec<Option<String>> = Vec::with_capacity(MAX_NAME_SERVERS);
        for host in nameservers.iter().take(MAX_NAME_SERVERS) {
            let host = host.trim();
            if host.is_empty() {
                codes.push(None);
                continue;
            }
            let envelope = self.create_dns_server(host, None).await?;
            codes.push(envelope.get_text("code"));
        }

        let slot = |index: usize| codes.get(index).cloned().flatten();
        let additional: Vec<Value> = (2..MAX_NAME_SERVERS)
            .filter_map(|index| slot(index))
            .map(Value::String)
            .collect();

        let mut body = RequestParams::new();
        body.insert("primary_server_code".into(), slot(0).unwrap_or_default().into());
        body.insert("secondary_server_code".into(), slot(1).unwrap_or_default().into());
        body.insert("additional_server_code".into(), Value::Array(additional));

        self.client
            .execute(&domain_path(&reference, "dns_servers"), body, Method::Put)
            .await
    }

    /// Renew for `period` years. Periods outside 1..=6, or missing, renew for
    /// one year.
    pub async fn renew(&self, domain: &str, args: &Args) -> Result<Envelope, RegistrarError> {
        let reference = DomainRef::resolve(domain)?;
        let duration = renew_period(args);

        let mut body = RequestParams::new();
        body.insert("duration".into(), duration.into());
        self.client
            .execute(&domain_path(&reference, "renew"), body, Method::Put)
            .await
    }

    pub async fn update_locked_domain(&self, domain: &str, lock: bool) -> Result<Envelope, RegistrarError> {
        let reference = DomainRef::resolve(domain)?;
        let mut body = RequestParams::new();
        body.insert("action".into(), Value::from(if lock { "LOCK" } else { "UNLOCK" }));
        self.client
            .execute(&domain_path(&reference, "state"), body, Method::Put)
            .await
    }

    /// Create a contact for `role` and attach it to `domain`.
    pub async fn assign_contact(
        &self,
        domain: &str,
        role: ContactRole,
        args: &Args,
    ) -> Result<Envelope, RegistrarError> {
        let reference = DomainRef::resolve(domain)?;
        let params = validate(&contact_spec(), &flatten_contacts(args))?;
        let code = self.created_contact_code("assignContact", &params, role).await?;

        let mut body = RequestParams::new();
        body.insert("contact_code".into(), code.into());
        body.insert("contact_type".into(), (role.contact_type() as u8).into());
        self.client
            .execute(&domain_path(&reference, "contacts"), body, Method::Put)
            .await
    }
}

fn provisioning_params(domain: &str, args: &Args) -> Result<RequestParams, RegistrarError> {
    let mut flat = flatten_contacts(args);
    if let Some(Value::Array(hosts)) = flat.get("nameservers") {
        let joined = hosts
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(",");
        flat.insert("nameservers".into(), Value::String(joined));
    }
    flat.insert("domain".into(), Value::String(domain.to_string()));

    let spec = [&PROVISIONING_ROWS[..], &contact_spec()[..]].concat();
    Ok(validate(&spec, &flat)?)
}

fn renew_period(args: &Args) -> i64 {
    let row = ParamSpec::optional("period", FieldType::Integer);
    args.get("period")
        .and_then(|value| coerce(&row, value).ok())
        .and_then(|value| value.as_i64())
        .filter(|period| (MIN_RENEW_PERIOD..=MAX_RENEW_PERIOD).contains(period))
        .unwrap_or(MIN_RENEW_PERIOD)
}

fn domain_path(reference: &DomainRef, suffix: &str) -> String {
    if suffix.is_empty() {
        format!("domains/{}", reference)
    } else {
        format!("domains/{}/{}", reference, suffix)
    }
}

/// Reference args overlaid with the caller's; caller keys win.
fn merged(reference: &DomainRef, args: &Args) -> Args {
    let mut merged = reference.to_args();
    for (key, value) in args {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

fn text_param(params: &RequestParams, key: &str) -> String {
    params
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
