//! Client configuration.
//!
//! Options are plain data: loading them from files or the environment is the
//! embedding application's concern. Every field has a default so partial
//! documents deserialize.

use serde::{Deserialize, Serialize};

fn default_port() -> u16 {
    443
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_connect_timeout_secs() -> u64 {
    30
}

/// Transport and error-handling options shared by every call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientOptions {
    /// Base URL of the API, e.g. `https://api.example.net/v2`.
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default, rename = "verifySSL")]
    pub verify_ssl: bool,
    /// When set, transport failures and error envelopes become `Err` values
    /// instead of being returned as decoded envelopes.
    #[serde(default)]
    pub throw_exceptions: bool,
    /// Extra `name -> version` pairs appended to the user agent.
    #[serde(default)]
    pub user_agent: Vec<(String, String)>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            verify_ssl: false,
            throw_exceptions: false,
            user_agent: Vec::new(),
        }
    }
}

impl ClientOptions {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            ..Self::default()
        }
    }

    pub fn throwing(mut self, throw_exceptions: bool) -> Self {
        self.throw_exceptions = throw_exceptions;
        self
    }

    /// Platform entries first, then caller entries; a caller entry with the
    /// same name replaces the platform one in place.
    pub fn user_agent_entries(&self) -> Vec<(String, String)> {
        let mut entries = vec![
            ("ClientPlatform".to_string(), "Rust".to_string()),
            (
                "ClientVersion".to_string(),
                env!("CARGO_PKG_VERSION").to_string(),
            ),
            (
                "OperatingSystem".to_string(),
                std::env::consts::OS.to_string(),
            ),
        ];
        for (name, version) in &self.user_agent {
            match entries.iter_mut().find(|(existing, _)| existing == name) {
                Some(entry) => entry.1 = version.clone(),
                None => entries.push((name.clone(), version.clone())),
            }
        }
        entries
    }

    /// `Name/Version;` pairs concatenated.
    pub fn user_agent_string(&self) -> String {
        self.user_agent_entries()
            .iter()
            .map(|(name, version)| format!("{}/{};", name, version))
            .collect()
    }
}

/// API credentials. `api_user` is the token sent in the `X-TOKEN` header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub api_user: String,
    #[serde(default)]
    pub api_passwd: String,
}

impl Credentials {
    pub fn new(api_user: &str, api_passwd: &str) -> Self {
        Self {
            api_user: api_user.to_string(),
            api_passwd: api_passwd.to_string(),
        }
    }
}
