//! Response envelope.
//!
//! Every call yields an [`Envelope`] decoded from the raw body. `success` is
//! tri-state: `Some(true)` for a structured body, `Some(false)` when the body
//! explicitly reports `"success": false`, and `None` when the body could not
//! be decoded at all. The last case is never treated as an application error.

use arsys_error::{ApiError, RegistrarError};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::output::OutputRegistry;

pub const DEFAULT_API_VERSION: &str = "2.0.0";

/// Key under which a top-level JSON array body is exposed.
pub const ITEMS_KEY: &str = "items";

/// Provider marker for a failed sub-call (`"type": "INTERNAL_ERROR"`).
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    success: Option<bool>,
    error_code: Option<String>,
    error_code_msg: Option<String>,
    action: Option<String>,
    version: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    messages: Vec<String>,
    #[serde(rename = "responseData")]
    payload: Map<String, Value>,
    #[serde(skip)]
    raw: String,
}

impl Envelope {
    pub fn decode(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let mut envelope = Self {
            success: None,
            error_code: None,
            error_code_msg: None,
            action: None,
            version: None,
            messages: Vec::new(),
            payload: Map::new(),
            raw,
        };

        let body = match serde_json::from_str::<Value>(&envelope.raw) {
            Ok(Value::Object(map)) => map,
            Ok(Value::Array(items)) => {
                let mut map = Map::new();
                map.insert(ITEMS_KEY.to_string(), Value::Array(items));
                map
            }
            _ => return envelope,
        };

        envelope.action = body.get("action").and_then(Value::as_str).map(String::from);
        envelope.version = Some(
            body.get("version")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_API_VERSION)
                .to_string(),
        );

        if body.get("success") == Some(&Value::Bool(false)) {
            envelope.success = Some(false);
            envelope.error_code = body.get("errorCode").and_then(code_text);
            envelope.error_code_msg = body
                .get("errorCodeMsg")
                .and_then(Value::as_str)
                .map(String::from);
            envelope.messages = collect_messages(&body, envelope.error_code_msg.as_deref());
        } else {
            envelope.success = Some(true);
        }

        envelope.payload = body;
        envelope
    }

    /// Fail according to the envelope state when `raise` is set; a no-op
    /// otherwise.
    pub fn read_response(&self, raise: bool) -> Result<(), RegistrarError> {
        if !raise {
            return Ok(());
        }
        match self.success {
            None => Err(RegistrarError::InvalidResponse {
                raw: self.raw.clone(),
            }),
            Some(false) => Err(self.cast_error()),
            Some(true) => Ok(()),
        }
    }

    /// Map this (failed) envelope to its typed error.
    pub fn cast_error(&self) -> RegistrarError {
        match self.error_code.as_deref().map(str::trim) {
            None | Some("") | Some("0") => RegistrarError::Unexpected {
                envelope: self.to_json(),
            },
            Some(code) => ApiError::from_code(code, self.messages.clone()).into(),
        }
    }

    pub fn success(&self) -> Option<bool> {
        self.success
    }

    pub fn is_success(&self) -> bool {
        self.success == Some(true)
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    pub fn error_code_msg(&self) -> Option<&str> {
        self.error_code_msg.as_deref()
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    pub fn into_payload(self) -> Map<String, Value> {
        self.payload
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// String or numeric payload value rendered as text; empty strings count
    /// as absent.
    pub fn get_text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(code_text)
    }

    pub fn set(&mut self, key: &str, value: Value) -> Option<&Value> {
        self.payload.insert(key.to_string(), value);
        self.get(key)
    }

    /// True when the provider flagged the call with `INTERNAL_ERROR`.
    pub fn is_internal_error(&self) -> bool {
        self.get("type").and_then(Value::as_str) == Some(INTERNAL_ERROR)
    }

    /// Whether a workflow may continue past this envelope.
    pub fn is_usable(&self) -> bool {
        self.is_success() && !self.is_internal_error()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Render the payload through a named output filter.
    pub fn output(&self, registry: &OutputRegistry, format: &str) -> Result<String, RegistrarError> {
        registry.render(format, &self.payload)
    }
}

fn code_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn collect_messages(body: &Map<String, Value>, fallback: Option<&str>) -> Vec<String> {
    match body.get("messages") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(String::from))
            .collect(),
        Some(Value::String(message)) => vec![message.clone()],
        _ => fallback.map(|m| vec![m.to_string()]).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arsys_error::ErrorKind;
    use serde_json::json;

    #[test]
    fn structured_success_body() {
        let raw = r#"{"success":true,"code":"SRCO-1","version":"2.1.0"}"#;
        let envelope = Envelope::decode(raw);
        assert_eq!(envelope.success(), Some(true));
        assert_eq!(envelope.error_code(), None);
        assert_eq!(envelope.error_code_msg(), None);
        assert_eq!(envelope.version(), Some("2.1.0"));
        let expected: Value = serde_json::from_str(raw).expect("json");
        assert_eq!(Value::Object(envelope.payload().clone()), expected);
        assert_eq!(envelope.raw(), raw);
    }

    #[test]
    fn body_without_success_flag_is_success() {
        let envelope = Envelope::decode(r#"{"code":"SRCO-1"}"#);
        assert!(envelope.is_success());
        assert_eq!(envelope.version(), Some(DEFAULT_API_VERSION));
        assert_eq!(envelope.get_text("code").as_deref(), Some("SRCO-1"));
    }

    #[test]
    fn unparseable_body_is_unknown_not_false() {
        let envelope = Envelope::decode("not json");
        assert_eq!(envelope.success(), None);
        assert!(envelope.payload().is_empty());
        assert!(envelope.read_response(false).is_ok());
        assert!(matches!(
            envelope.read_response(true),
            Err(RegistrarError::InvalidResponse { raw }) if raw == "not json"
        ));

        assert_eq!(Envelope::decode("").success(), None);
        assert_eq!(Envelope::decode("42").success(), None);
    }

    #[test]
    fn array_body_is_wrapped() {
        let envelope = Envelope::decode(r#"[{"sld":"example","tld":"es"}]"#);
        assert!(envelope.is_success());
        assert_eq!(envelope.get(ITEMS_KEY).and_then(Value::as_array).map(Vec::len), Some(1));
    }

    #[test]
    fn failure_body_casts_to_typed_error() {
        let envelope = Envelope::decode(
            r#"{"success":false,"errorCode":"2010","messages":["Domain already registered"]}"#,
        );
        assert_eq!(envelope.success(), Some(false));
        assert_eq!(envelope.error_code(), Some("2010"));
        match envelope.read_response(true) {
            Err(RegistrarError::Api(err)) => {
                assert_eq!(err.kind, ErrorKind::DomainTaken);
                assert_eq!(err.messages, vec!["Domain already registered".to_string()]);
            }
            other => panic!("unexpected: {:?}", other),
        }
        // Without raising the envelope is handed back untouched.
        assert!(envelope.read_response(false).is_ok());
    }

    #[test]
    fn numeric_codes_and_login_required() {
        let envelope = Envelope::decode(r#"{"success":false,"errorCode":200,"errorCodeMsg":"Login required"}"#);
        assert_eq!(envelope.error_code(), Some("200"));
        assert_eq!(envelope.messages(), ["Login required".to_string()]);
        assert_eq!(envelope.cast_error().kind(), Some(ErrorKind::LoginRequired));
    }

    #[test]
    fn unmapped_code_keeps_raw_code() {
        let envelope = Envelope::decode(r#"{"success":false,"errorCode":"9999","messages":"odd"}"#);
        match envelope.cast_error() {
            RegistrarError::Api(err) => {
                assert_eq!(err.kind, ErrorKind::Generic);
                assert_eq!(err.code, "9999");
                assert_eq!(err.messages, vec!["odd".to_string()]);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn falsy_code_is_unexpected() {
        for body in [
            r#"{"success":false}"#,
            r#"{"success":false,"errorCode":0}"#,
            r#"{"success":false,"errorCode":""}"#,
        ] {
            let envelope = Envelope::decode(body);
            match envelope.cast_error() {
                RegistrarError::Unexpected { envelope } => {
                    assert!(envelope.contains("\"success\":false"), "{}", envelope)
                }
                other => panic!("{} gave {:?}", body, other),
            }
        }
    }

    #[test]
    fn get_distinguishes_absent_from_falsy() {
        let mut envelope = Envelope::decode(r#"{"locked":false,"tags":[]}"#);
        assert_eq!(envelope.get("locked"), Some(&json!(false)));
        assert_eq!(envelope.get("tags"), Some(&json!([])));
        assert_eq!(envelope.get("missing"), None);

        let stored = envelope.set("contactOwner", json!({"name": "Ana"})).cloned();
        assert_eq!(stored, Some(json!({"name": "Ana"})));
        assert!(envelope.get("contactOwner").is_some());
    }

    #[test]
    fn internal_error_marker() {
        let envelope = Envelope::decode(r#"{"type":"INTERNAL_ERROR","message":"missing data"}"#);
        assert!(envelope.is_success());
        assert!(envelope.is_internal_error());
        assert!(!envelope.is_usable());
    }
}
