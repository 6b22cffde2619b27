//! Contact descriptors and the flat contact-field vocabulary.
//!
//! Callers describe contacts either flat (`ownerContactFirstName`) or nested
//! (`owner: { firstName }`). Nested blocks are flattened first so validation
//! and descriptor building only ever see the flat form.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::params::{Args, FieldType, ParamSpec, RequestParams};

pub const CONTACT_TYPES: &[&str] = &["individual", "organization"];

/// The four roles a domain can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactRole {
    Owner,
    Admin,
    Tech,
    Billing,
}

impl ContactRole {
    pub const ALL: [ContactRole; 4] = [Self::Owner, Self::Admin, Self::Tech, Self::Billing];

    pub fn prefix(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Tech => "tech",
            Self::Billing => "billing",
        }
    }

    /// Provider contact type: the owner is the registrant, everything else a
    /// common contact.
    pub fn contact_type(self) -> ContactType {
        match self {
            Self::Owner => ContactType::Registrant,
            _ => ContactType::Common,
        }
    }

    fn field(self, suffix: &str) -> String {
        format!("{}Contact{}", self.prefix(), suffix)
    }
}

impl std::fmt::Display for ContactRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactType {
    Registrant = 1,
    Common = 2,
}

/// Body of a `contacts` creation call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDescriptor {
    #[serde(rename = "type")]
    pub contact_type: u8,
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub province: String,
    pub country_code: String,
    pub email: String,
    pub fiscal_number: String,
    pub phone: String,
}

impl ContactDescriptor {
    /// Build the descriptor for `role` from flat, validated parameters.
    /// Missing fields become empty strings.
    pub fn from_params(params: &RequestParams, role: ContactRole) -> Self {
        let text = |suffix: &str| -> String {
            params
                .get(&role.field(suffix))
                .and_then(|v| match v {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .unwrap_or_default()
        };

        let name = format!("{} {}", text("FirstName"), text("LastName"))
            .trim()
            .to_string();

        Self {
            contact_type: role.contact_type() as u8,
            name,
            address: text("Address"),
            city: text("City"),
            postal_code: text("PostalCode"),
            province: text("State"),
            country_code: text("Country"),
            email: text("Email"),
            fiscal_number: text("IdentNumber"),
            phone: text("Phone").replace('.', " "),
        }
    }

    /// Request body with empty fields omitted.
    pub fn to_params(&self) -> RequestParams {
        let mut params = RequestParams::new();
        params.insert("type".to_string(), Value::from(self.contact_type));
        let fields = [
            ("name", &self.name),
            ("address", &self.address),
            ("city", &self.city),
            ("postal_code", &self.postal_code),
            ("province", &self.province),
            ("country_code", &self.country_code),
            ("email", &self.email),
            ("fiscal_number", &self.fiscal_number),
            ("phone", &self.phone),
        ];
        for (key, value) in fields {
            if !value.is_empty() {
                params.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        params
    }
}

/// Whether the caller supplied a contact block for `role`.
pub fn has_block(params: &RequestParams, role: ContactRole) -> bool {
    params.contains_key(&role.field("FirstName"))
}

/// Expand nested `owner`/`admin`/`tech`/`billing` objects into flat
/// `{role}Contact{Field}` keys. Flat keys pass through untouched; a flat key
/// wins over the same field given nested.
pub fn flatten_contacts(args: &Args) -> Args {
    let mut flat = Args::new();
    for (key, value) in args {
        let role = ContactRole::ALL.iter().find(|role| role.prefix() == key.as_str());
        match (role, value) {
            (Some(role), Value::Object(block)) => {
                for (field, field_value) in block {
                    let name = role.field(&capitalize(field));
                    if !args.contains_key(&name) {
                        flat.insert(name, field_value.clone());
                    }
                }
            }
            _ => {
                flat.insert(key.clone(), value.clone());
            }
        }
    }
    flat
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

macro_rules! contact_rows {
    ($role:literal, $bypass:expr) => {
        [
            ParamSpec::optional(concat!($role, "ContactID"), FieldType::Identifier),
            ParamSpec::optional(concat!($role, "ContactType"), FieldType::OneOf(CONTACT_TYPES)),
            ParamSpec::optional(concat!($role, "ContactFirstName"), FieldType::Text)
                .with_bypass($bypass),
            ParamSpec::optional(concat!($role, "ContactLastName"), FieldType::Text)
                .with_bypass($bypass),
            ParamSpec::optional(concat!($role, "ContactOrgName"), FieldType::Text),
            ParamSpec::optional(concat!($role, "ContactOrgType"), FieldType::Text),
            ParamSpec::optional(concat!($role, "ContactIdentNumber"), FieldType::Text)
                .with_bypass($bypass),
            ParamSpec::optional(concat!($role, "ContactEmail"), FieldType::Email)
                .with_bypass($bypass),
            ParamSpec::optional(concat!($role, "ContactPhone"), FieldType::Phone)
                .with_bypass($bypass),
            ParamSpec::optional(concat!($role, "ContactFax"), FieldType::Phone),
            ParamSpec::optional(concat!($role, "ContactAddress"), FieldType::Text)
                .with_bypass($bypass),
            ParamSpec::optional(concat!($role, "ContactPostalCode"), FieldType::Text)
                .with_bypass($bypass),
            ParamSpec::optional(concat!($role, "ContactCity"), FieldType::Text)
                .with_bypass($bypass),
            ParamSpec::optional(concat!($role, "ContactState"), FieldType::Text)
                .with_bypass($bypass),
            ParamSpec::optional(concat!($role, "ContactCountry"), FieldType::Text)
                .with_bypass($bypass),
        ]
    };
}

pub const OWNER_ROWS: [ParamSpec; 15] = contact_rows!("owner", Some("ownerContactID"));
pub const ADMIN_ROWS: [ParamSpec; 15] = contact_rows!("admin", None);
pub const TECH_ROWS: [ParamSpec; 15] = contact_rows!("tech", None);
pub const BILLING_ROWS: [ParamSpec; 15] = contact_rows!("billing", None);

/// Rows for every contact field of every role.
pub fn contact_spec() -> Vec<ParamSpec> {
    [OWNER_ROWS, ADMIN_ROWS, TECH_ROWS, BILLING_ROWS].concat()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::validate;
    use serde_json::json;

    #[test]
    fn nested_blocks_flatten() {
        let args = json!({
            "owner": {"firstName": "Ana", "lastName": "Ruiz", "email": "ana@example.es"},
            "ownerContactEmail": "flat@example.es",
            "nameservers": "ns1.example.net"
        });
        let flat = flatten_contacts(args.as_object().expect("object"));
        assert_eq!(flat.get("ownerContactFirstName"), Some(&json!("Ana")));
        assert_eq!(flat.get("ownerContactLastName"), Some(&json!("Ruiz")));
        assert_eq!(flat.get("ownerContactEmail"), Some(&json!("flat@example.es")));
        assert_eq!(flat.get("nameservers"), Some(&json!("ns1.example.net")));
        assert!(flat.get("owner").is_none());
    }

    #[test]
    fn descriptor_from_validated_params() {
        let args = json!({
            "adminContactFirstName": "Luis",
            "adminContactLastName": "Gil",
            "adminContactPhone": "+34.600111222",
            "adminContactCountry": "ES",
            "adminContactIdentNumber": "12345678Z",
            "adminContactState": "Madrid"
        });
        let params = validate(&contact_spec(), args.as_object().expect("object"))
            .expect("valid contact");
        let descriptor = ContactDescriptor::from_params(&params, ContactRole::Admin);
        assert_eq!(descriptor.contact_type, 2);
        assert_eq!(descriptor.name, "Luis Gil");
        assert_eq!(descriptor.phone, "+34 600111222");
        assert_eq!(descriptor.province, "Madrid");
        assert_eq!(descriptor.fiscal_number, "12345678Z");

        let body = descriptor.to_params();
        let keys: Vec<&String> = body.keys().collect();
        assert_eq!(
            keys,
            vec!["type", "name", "province", "country_code", "fiscal_number", "phone"]
        );
    }

    #[test]
    fn missing_role_yields_empty_descriptor() {
        let descriptor = ContactDescriptor::from_params(&RequestParams::new(), ContactRole::Owner);
        assert_eq!(descriptor.contact_type, 1);
        assert!(descriptor.name.is_empty());
        assert_eq!(descriptor.to_params().len(), 1);
    }

    #[test]
    fn contact_rows_reject_bad_email() {
        let args = json!({"techContactEmail": "nope"});
        let err = validate(&contact_spec(), args.as_object().expect("object"))
            .expect_err("bad email");
        assert_eq!(err.field, "techContactEmail");
    }

    #[test]
    fn block_presence_keys_on_first_name() {
        let mut params = RequestParams::new();
        params.insert("techContactEmail".into(), json!("t@example.es"));
        assert!(!has_block(&params, ContactRole::Tech));
        params.insert("techContactFirstName".into(), json!("T"));
        assert!(has_block(&params, ContactRole::Tech));
    }
}
