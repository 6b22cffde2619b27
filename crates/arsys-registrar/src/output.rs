//! Pluggable output filters for rendering response payloads.

use std::collections::HashMap;

use arsys_error::RegistrarError;
use serde_json::{Map, Value};

/// Renders a payload into a string representation.
pub trait OutputFilter: Send + Sync {
    fn render(&self, payload: &Map<String, Value>) -> Result<String, RegistrarError>;
}

/// JSON rendering, compact or indented.
pub struct JsonFilter {
    pub pretty: bool,
}

impl OutputFilter for JsonFilter {
    fn render(&self, payload: &Map<String, Value>) -> Result<String, RegistrarError> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(payload)
        } else {
            serde_json::to_string(payload)
        };
        rendered.map_err(|e| RegistrarError::Config(format!("cannot render payload: {}", e)))
    }
}

/// `key: value` lines. Nested values are flattened with dotted keys.
pub struct PlainFilter;

impl OutputFilter for PlainFilter {
    fn render(&self, payload: &Map<String, Value>) -> Result<String, RegistrarError> {
        let mut lines = Vec::new();
        for (key, value) in payload {
            plain_lines(key, value, &mut lines);
        }
        Ok(lines.join("\n"))
    }
}

fn plain_lines(prefix: &str, value: &Value, lines: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                plain_lines(&format!("{}.{}", prefix, key), nested, lines);
            }
        }
        Value::Array(items) => {
            for (index, nested) in items.iter().enumerate() {
                plain_lines(&format!("{}.{}", prefix, index), nested, lines);
            }
        }
        Value::String(s) => lines.push(format!("{}: {}", prefix, s)),
        Value::Null => lines.push(format!("{}:", prefix)),
        other => lines.push(format!("{}: {}", prefix, other)),
    }
}

/// Filters by name. Starts with `json`, `pretty` and `plain`.
pub struct OutputRegistry {
    filters: HashMap<String, Box<dyn OutputFilter>>,
}

impl Default for OutputRegistry {
    fn default() -> Self {
        let mut registry = Self {
            filters: HashMap::new(),
        };
        registry.register("json", JsonFilter { pretty: false });
        registry.register("pretty", JsonFilter { pretty: true });
        registry.register("plain", PlainFilter);
        registry
    }
}

impl OutputRegistry {
    /// Add or replace a filter.
    pub fn register(&mut self, name: &str, filter: impl OutputFilter + 'static) {
        self.filters.insert(name.to_string(), Box::new(filter));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    pub fn render(&self, name: &str, payload: &Map<String, Value>) -> Result<String, RegistrarError> {
        let filter = self
            .filters
            .get(name)
            .ok_or_else(|| RegistrarError::Config(format!("unknown output format '{}'", name)))?;
        filter.render(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Envelope;

    struct KeysFilter;

    impl OutputFilter for KeysFilter {
        fn render(&self, payload: &Map<String, Value>) -> Result<String, RegistrarError> {
            Ok(payload.keys().cloned().collect::<Vec<_>>().join(","))
        }
    }

    #[test]
    fn builtin_filters() {
        let envelope = Envelope::decode(r#"{"domain":"example.es","status":{"locked":true}}"#);
        let registry = OutputRegistry::default();

        assert_eq!(
            envelope.output(&registry, "json").expect("json"),
            r#"{"domain":"example.es","status":{"locked":true}}"#
        );
        assert!(envelope.output(&registry, "pretty").expect("pretty").contains("\n  \"domain\""));
        assert_eq!(
            envelope.output(&registry, "plain").expect("plain"),
            "domain: example.es\nstatus.locked: true"
        );
    }

    #[test]
    fn custom_filter_and_unknown_name() {
        let mut registry = OutputRegistry::default();
        registry.register("keys", KeysFilter);
        let envelope = Envelope::decode(r#"{"a":1,"b":2}"#);
        assert_eq!(envelope.output(&registry, "keys").expect("keys"), "a,b");
        assert!(matches!(
            envelope.output(&registry, "xml"),
            Err(RegistrarError::Config(_))
        ));
    }
}
