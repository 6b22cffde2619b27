//! HTTP transport.
//!
//! The [`Transport`] trait is the seam between the request-building core and
//! the network. [`HttpTransport`] is the production implementation on top of
//! `reqwest`; tests script their own.

use std::time::{Duration, Instant};

use arsys_error::RegistrarError;
use reqwest::{Client, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::ClientOptions;
use crate::params::RequestParams;

/// Body fields that carry credentials and must never leave in a body.
pub const CREDENTIAL_FIELDS: &[&str] = &["apiuser", "apipasswd"];

/// Transport error numbers, in the provider's transport numbering.
pub mod codes {
    pub const MALFORMED_URL: i64 = 3;
    pub const CONNECT: i64 = 7;
    pub const TIMEOUT: i64 = 28;
    pub const RECEIVE: i64 = 56;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// POST and PUT carry a JSON body; GET and DELETE a query string.
    pub fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub path: String,
    pub params: RequestParams,
    pub method: Method,
    /// Bearer token, sent only as the `X-TOKEN` header.
    pub credential: String,
}

impl ApiRequest {
    pub fn new(path: &str, params: RequestParams, method: Method, credential: &str) -> Self {
        Self {
            path: path.to_string(),
            params: strip_credentials(params),
            method,
            credential: credential.to_string(),
        }
    }
}

/// Connectivity, TLS or timeout failure below the application layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("HTTP error ({code}): {message}")]
pub struct TransportError {
    pub code: i64,
    pub message: String,
}

impl From<TransportError> for RegistrarError {
    fn from(err: TransportError) -> Self {
        RegistrarError::Transport {
            code: err.code,
            message: err.message,
        }
    }
}

/// Sends one request and hands back the raw response body.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<String, TransportError>;
}

pub fn strip_credentials(mut params: RequestParams) -> RequestParams {
    for field in CREDENTIAL_FIELDS {
        params.remove(*field);
    }
    params
}

/// Flatten params into query pairs. Arrays repeat the key with a `[]`
/// suffix; nulls are skipped.
pub fn query_pairs(params: &RequestParams) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in params {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    if let Some(text) = scalar_text(item) {
                        pairs.push((format!("{}[]", key), text));
                    }
                }
            }
            other => {
                if let Some(text) = scalar_text(other) {
                    pairs.push((key.clone(), text));
                }
            }
        }
    }
    pairs
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        other => Some(other.to_string()),
    }
}

pub struct HttpTransport {
    client: Client,
    endpoint: String,
    port: u16,
}

impl HttpTransport {
    pub fn new(options: &ClientOptions) -> Result<Self, RegistrarError> {
        let endpoint = options.endpoint.trim().trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            return Err(RegistrarError::Config("endpoint is not set".to_string()));
        }
        Url::parse(&endpoint)
            .map_err(|e| RegistrarError::Config(format!("invalid endpoint '{}': {}", endpoint, e)))?;

        let client = Client::builder()
            .user_agent(options.user_agent_string())
            .timeout(Duration::from_secs(options.timeout_secs))
            .connect_timeout(Duration::from_secs(options.connect_timeout_secs))
            .danger_accept_invalid_certs(!options.verify_ssl)
            .build()
            .map_err(|e| RegistrarError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            port: options.port,
        })
    }

    fn url(&self, path: &str) -> Result<Url, TransportError> {
        let raw = format!("{}/{}", self.endpoint, path.trim().trim_start_matches('/'));
        let mut url = Url::parse(&raw).map_err(|e| TransportError {
            code: codes::MALFORMED_URL,
            message: format!("{}: {}", raw, e),
        })?;
        url.set_port(Some(self.port)).map_err(|_| TransportError {
            code: codes::MALFORMED_URL,
            message: format!("{}: cannot carry a port", raw),
        })?;
        Ok(url)
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    let code = if err.is_timeout() {
        codes::TIMEOUT
    } else if err.is_connect() {
        codes::CONNECT
    } else if err.is_builder() {
        codes::MALFORMED_URL
    } else {
        codes::RECEIVE
    };
    TransportError {
        code,
        message: err.to_string(),
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<String, TransportError> {
        let url = self.url(&request.path)?;
        let params = strip_credentials(request.params);

        debug!(method = %request.method, url = %url, "calling API");
        debug!(
            parameters = %serde_json::to_string(&params).unwrap_or_default(),
            "request parameters"
        );

        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let builder = self
            .client
            .request(method, url)
            .header("X-TOKEN", request.credential.as_str());
        let builder = if request.method.has_body() {
            builder.json(&params)
        } else {
            builder.query(&query_pairs(&params))
        };

        let start = Instant::now();
        let response = builder.send().await.map_err(classify)?;
        let body = response.text().await.map_err(classify)?;

        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            response = %body,
            "call completed"
        );
        Ok(body)
    }
}
