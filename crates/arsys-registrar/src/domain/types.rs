//! Shared types for the domain lifecycle operations.
//!
//! A domain is referenced either by name or by provider identifier; the
//! choice is made once, at the boundary, by [`DomainRef::resolve`], which
//! also refuses anything that is unsafe to place in a request path.

use std::str::FromStr;

use arsys_error::{RegistrarError, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::params::{is_domain_name, path_segment, Args};
use crate::response::Envelope;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "lowercase")]
pub enum DomainRef {
    #[serde(rename = "name")]
    ByName(String),
    #[serde(rename = "id")]
    ById(String),
}

impl DomainRef {
    /// A dot anywhere past the first character marks a name; anything else
    /// is an identifier. Names are lowercased and must be well formed;
    /// identifiers must be a single path segment.
    pub fn resolve(input: &str) -> Result<Self, ValidationError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ValidationError::missing_pair("domain", "domainID"));
        }
        match input.find('.') {
            Some(index) if index > 0 => {
                let name = input.to_lowercase();
                if is_domain_name(&name) {
                    Ok(Self::ByName(name))
                } else {
                    Err(ValidationError::invalid(
                        "domain",
                        format!("'{}' is not a valid domain name", name),
                    ))
                }
            }
            _ => path_segment("domainID", input).map(Self::ById),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::ByName(name) => name,
            Self::ById(id) => id,
        }
    }

    /// `{"domain": ..}` or `{"domainID": ..}`.
    pub fn to_args(&self) -> Args {
        let key = match self {
            Self::ByName(_) => "domain",
            Self::ById(_) => "domainID",
        };
        let mut args = Args::new();
        args.insert(key.to_string(), Value::String(self.as_str().to_string()));
        args
    }
}

impl std::fmt::Display for DomainRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detail sections accepted by `getInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfoType {
    Status,
    Contact,
    Nameservers,
    Authcode,
    Service,
    Gluerecords,
    Dnssec,
}

pub const INFO_TYPES: &[&str] = &[
    "status",
    "contact",
    "nameservers",
    "authcode",
    "service",
    "gluerecords",
    "dnssec",
];

/// Sections the domain listing can expand.
pub const LIST_INFO_TYPES: &[&str] = &["status", "contact", "nameservers", "service", "gluerecords"];

pub const OWNER_VERIFICATION: &[&str] = &["verified", "notapplicable", "inprocess", "failed"];

/// Contact that receives the transfer authorization mail.
pub const FOA_CONTACTS: &[&str] = &["owner", "admin"];

impl InfoType {
    pub const ALL: [InfoType; 7] = [
        Self::Status,
        Self::Contact,
        Self::Nameservers,
        Self::Authcode,
        Self::Service,
        Self::Gluerecords,
        Self::Dnssec,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Contact => "contact",
            Self::Nameservers => "nameservers",
            Self::Authcode => "authcode",
            Self::Service => "service",
            Self::Gluerecords => "gluerecords",
            Self::Dnssec => "dnssec",
        }
    }
}

impl FromStr for InfoType {
    type Err = RegistrarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|info_type| info_type.as_str() == s)
            .ok_or_else(|| RegistrarError::Config(format!("unknown info type '{}'", s)))
    }
}

/// Resource codes gathered before a registration or transfer call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionedCodes {
    pub registrant_code: String,
    pub admin_code: String,
    pub tech_code: String,
    pub servers_code: Vec<String>,
}

impl ProvisionedCodes {
    pub fn to_params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("registrant_code".into(), Value::from(self.registrant_code.clone()));
        params.insert("admin_code".into(), Value::from(self.admin_code.clone()));
        params.insert("tech_code".into(), Value::from(self.tech_code.clone()));
        params.insert("servers_code".into(), Value::from(self.servers_code.clone()));
        params
    }
}

/// Result of a dispatched operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutput {
    Envelope(Envelope),
    /// Nameserver payloads; `None` when the domain has no nameserver codes.
    Nameservers(Option<Vec<Map<String, Value>>>),
}

impl OperationOutput {
    pub fn envelope(&self) -> Option<&Envelope> {
        match self {
            Self::Envelope(envelope) => Some(envelope),
            Self::Nameservers(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(input: &str) -> DomainRef {
        DomainRef::resolve(input).expect("valid reference")
    }

    #[test]
    fn resolve_domain_reference() {
        assert_eq!(resolved("example.com"), DomainRef::ByName("example.com".into()));
        assert_eq!(resolved("D12345"), DomainRef::ById("D12345".into()));
        assert_eq!(resolved(" Example.ES "), DomainRef::ByName("example.es".into()));
        // A leading dot is not enough to make a name.
        assert_eq!(resolved(".hidden"), DomainRef::ById(".hidden".into()));
    }

    #[test]
    fn unsafe_references_are_rejected() {
        let err = DomainRef::resolve("  ").expect_err("blank");
        assert_eq!(err, ValidationError::missing_pair("domain", "domainID"));

        for bad in ["..", "../contacts", "D1/state", "a b"] {
            let err = DomainRef::resolve(bad).expect_err(bad);
            assert_eq!(err.field, "domainID", "{}", bad);
        }
        for bad in ["not a domain.com", "example.com/../contacts"] {
            let err = DomainRef::resolve(bad).expect_err(bad);
            assert_eq!(err.field, "domain", "{}", bad);
        }
    }

    #[test]
    fn reference_args_use_matching_key() {
        let by_name = resolved("example.com").to_args();
        assert_eq!(by_name.get("domain"), Some(&Value::from("example.com")));
        let by_id = resolved("12345").to_args();
        assert_eq!(by_id.get("domainID"), Some(&Value::from("12345")));
        assert!(!by_id.contains_key("domain"));
    }

    #[test]
    fn info_type_names_round_trip_through_list() {
        for name in INFO_TYPES {
            let parsed: InfoType = name.parse().expect("known info type");
            assert_eq!(parsed.as_str(), *name);
        }
        assert!("whois".parse::<InfoType>().is_err());
    }
}
