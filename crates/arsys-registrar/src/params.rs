//! Declarative request-parameter validation.
//!
//! Each API call declares its accepted fields as a slice of [`ParamSpec`]
//! rows. [`validate`] walks the rows in declaration order against loose
//! caller arguments and produces the request body: values are coerced to the
//! declared type, unknown fields are dropped, and required fields are
//! enforced.
//!
//! ## Alternates
//!
//! A row may name a `bypass` partner (e.g. `domain` / `domainID`). The
//! partner is checked first: when it is present and valid the row is
//! satisfied, and the row's own value is forwarded only if it is valid too.
//! Otherwise the row is validated on its own, so both absent is rejected.
//! When both are valid both are forwarded; consumers that need a single
//! value take the row declared first.

use std::net::{Ipv4Addr, Ipv6Addr};

use arsys_error::ValidationError;
use serde_json::{Map, Number, Value};

/// Loose caller arguments.
pub type Args = Map<String, Value>;

/// A validated, ordered request body.
pub type RequestParams = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    Boolean,
    /// One of a fixed set of string values.
    OneOf(&'static [&'static str]),
    DomainName,
    Email,
    Phone,
    Ipv4,
    Ipv6,
    /// Opaque provider identifier (contact code, domain ID, ...).
    Identifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
    pub bypass: Option<&'static str>,
}

impl ParamSpec {
    pub const fn required(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: true,
            bypass: None,
        }
    }

    pub const fn optional(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: false,
            bypass: None,
        }
    }

    pub const fn or(self, bypass: &'static str) -> Self {
        Self {
            bypass: Some(bypass),
            ..self
        }
    }

    pub const fn with_bypass(self, bypass: Option<&'static str>) -> Self {
        Self { bypass, ..self }
    }
}

/// `domain` / `domainID` alternates used by most domain calls.
pub const DOMAIN: ParamSpec = ParamSpec::required("domain", FieldType::DomainName).or("domainID");
pub const DOMAIN_ID: ParamSpec = ParamSpec::required("domainID", FieldType::Identifier).or("domain");

/// Validate `args` against `spec` and build the request body.
pub fn validate(spec: &[ParamSpec], args: &Args) -> Result<RequestParams, ValidationError> {
    let mut params = RequestParams::new();

    for row in spec {
        let own = present(args, row.name);

        if let Some(partner) = row.bypass {
            if partner_satisfied(spec, partner, args) {
                // Satisfied by the partner: forward our own value only if it holds up.
                if let Some(value) = own.and_then(|value| coerce(row, value).ok()) {
                    params.insert(row.name.to_string(), value);
                }
                continue;
            }
        }

        match own {
            Some(value) => {
                params.insert(row.name.to_string(), coerce(row, value)?);
            }
            None if row.required => {
                return Err(match row.bypass {
                    Some(partner) => ValidationError::missing_pair(row.name, partner),
                    None => ValidationError::missing(row.name),
                });
            }
            None => {}
        }
    }

    Ok(params)
}

fn present<'a>(args: &'a Args, name: &str) -> Option<&'a Value> {
    match args.get(name) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(value) => Some(value),
    }
}

fn partner_satisfied(spec: &[ParamSpec], partner: &str, args: &Args) -> bool {
    let Some(value) = present(args, partner) else {
        return false;
    };
    match spec.iter().find(|row| row.name == partner) {
        Some(row) => coerce(row, value).is_ok(),
        None => true,
    }
}

/// Coerce a single present value to the row's declared type.
pub fn coerce(row: &ParamSpec, value: &Value) -> Result<Value, ValidationError> {
    let name = row.name;
    match row.ty {
        FieldType::Text => scalar_text(value)
            .map(Value::String)
            .ok_or_else(|| ValidationError::invalid(name, "expected a string")),

        FieldType::Integer => coerce_integer(value)
            .map(|n| Value::Number(Number::from(n)))
            .ok_or_else(|| ValidationError::invalid(name, "expected an integer")),

        FieldType::Boolean => coerce_bool(value)
            .map(Value::Bool)
            .ok_or_else(|| ValidationError::invalid(name, "expected a boolean")),

        FieldType::OneOf(allowed) => {
            let text = scalar_text(value)
                .ok_or_else(|| ValidationError::invalid(name, "expected a string"))?;
            if allowed.contains(&text.as_str()) {
                Ok(Value::String(text))
            } else {
                Err(ValidationError::invalid(
                    name,
                    format!("'{}' is not one of: {}", text, allowed.join(", ")),
                ))
            }
        }

        FieldType::DomainName => {
            let text = string_only(name, value)?.trim().to_lowercase();
            if is_domain_name(&text) {
                Ok(Value::String(text))
            } else {
                Err(ValidationError::invalid(name, format!("'{}' is not a valid domain name", text)))
            }
        }

        FieldType::Email => {
            let text = string_only(name, value)?.trim().to_string();
            if is_email(&text) {
                Ok(Value::String(text))
            } else {
                Err(ValidationError::invalid(name, format!("'{}' is not a valid email address", text)))
            }
        }

        FieldType::Phone => {
            let text = scalar_text(value)
                .ok_or_else(|| ValidationError::invalid(name, "expected a phone number"))?;
            let text = text.trim().to_string();
            if is_phone(&text) {
                Ok(Value::String(text))
            } else {
                Err(ValidationError::invalid(name, format!("'{}' is not a valid phone number", text)))
            }
        }

        FieldType::Ipv4 => string_only(name, value)?
            .trim()
            .parse::<Ipv4Addr>()
            .map(|ip| Value::String(ip.to_string()))
            .map_err(|_| ValidationError::invalid(name, "expected an IPv4 address")),

        FieldType::Ipv6 => string_only(name, value)?
            .trim()
            .parse::<Ipv6Addr>()
            .map(|ip| Value::String(ip.to_string()))
            .map_err(|_| ValidationError::invalid(name, "expected an IPv6 address")),

        FieldType::Identifier => scalar_text(value)
            .map(|s| s.trim().to_string())
            .filter(|s| is_identifier(s))
            .map(Value::String)
            .ok_or_else(|| ValidationError::invalid(name, "expected an identifier")),
    }
}

fn string_only<'a>(name: &str, value: &'a Value) -> Result<&'a str, ValidationError> {
    value
        .as_str()
        .ok_or_else(|| ValidationError::invalid(name, "expected a string"))
}

/// Strings, numbers and booleans rendered as text; containers rejected.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub(crate) fn is_domain_name(name: &str) -> bool {
    let name = name.strip_suffix('.').unwrap_or(name);
    if name.is_empty() || name.len() > 253 {
        return false;
    }
    let labels: Vec<&str> = name.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    labels.iter().all(|label| {
        !label.is_empty()
            && label.chars().count() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    })
}

fn is_email(email: &str) -> bool {
    let mut parts = email.splitn(2, '@');
    let (Some(local), Some(host)) = (parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && !host.contains('@')
        && !local.chars().any(char::is_whitespace)
        && is_domain_name(&host.to_lowercase())
}

/// Provider format is `+CC.NUMBER`; spaces, dashes and a single dot separator
/// are tolerated.
fn is_phone(phone: &str) -> bool {
    let body = phone.strip_prefix('+').unwrap_or(phone);
    if body.matches('.').count() > 1 {
        return false;
    }
    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | ' ' | '-'))
    {
        return false;
    }
    let digits = body.chars().filter(char::is_ascii_digit).count();
    (6..=20).contains(&digits)
}

/// Identifiers are sent as URL path segments.
fn is_identifier(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '\\' | '?' | '#' | '%'))
}

/// A caller- or provider-supplied identifier that is about to be placed in a
/// request path.
pub(crate) fn path_segment(field: &str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::missing(field));
    }
    if !is_identifier(value) {
        return Err(ValidationError::invalid(
            field,
            format!("'{}' is not a valid identifier", value),
        ));
    }
    Ok(value.to_string())
}
