use serde::Serialize;
use thiserror::Error;

use crate::kind::ErrorKind;

/// An application-level failure reported by the provider in a response
/// envelope, already resolved to its [`ErrorKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{kind} (code {code}): {}", .messages.join("; "))]
pub struct ApiError {
    pub kind: ErrorKind,
    /// Raw `errorCode`, kept even when the kind is [`ErrorKind::Generic`].
    pub code: String,
    pub messages: Vec<String>,
}

impl ApiError {
    pub fn from_code(code: impl Into<String>, messages: Vec<String>) -> Self {
        let code = code.into();
        Self {
            kind: ErrorKind::from_code(&code),
            code,
            messages,
        }
    }
}

/// A request argument rejected before anything was sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("Invalid parameter '{field}': {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn missing(field: &str) -> Self {
        Self {
            field: field.to_string(),
            reason: "required parameter is missing".to_string(),
        }
    }

    pub fn missing_pair(field: &str, alternate: &str) -> Self {
        Self {
            field: field.to_string(),
            reason: format!("either '{}' or '{}' is required", field, alternate),
        }
    }

    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Every failure surfaced by the registrar client.
#[derive(Debug, Error)]
pub enum RegistrarError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Connectivity, TLS or timeout failure below the HTTP layer.
    #[error("HTTP error ({code}): {message}")]
    Transport { code: i64, message: String },

    /// The body could not be decoded as structured data.
    #[error("Invalid response: {raw}")]
    InvalidResponse { raw: String },

    /// The envelope claims failure but carries no error code.
    #[error("Got an unexpected error: {envelope}")]
    Unexpected { envelope: String },

    /// A multi-step workflow aborted at `stage`.
    #[error("{stage}: {message}")]
    Workflow { stage: String, message: String },

    #[error("Lookup of '{host}' failed: {message}")]
    Lookup { host: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RegistrarError {
    pub fn workflow(stage: &str, message: impl Into<String>) -> Self {
        Self::Workflow {
            stage: stage.to_string(),
            message: message.into(),
        }
    }

    /// The typed kind behind this error, when it has one.
    ///
    /// Transport, workflow, lookup and configuration failures never reached
    /// the provider's error taxonomy and return `None`.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Validation(_) => Some(ErrorKind::Validation),
            Self::Api(e) => Some(e.kind),
            Self::InvalidResponse { .. } | Self::Unexpected { .. } => Some(ErrorKind::Generic),
            Self::Transport { .. } | Self::Workflow { .. } | Self::Lookup { .. } | Self::Config(_) => {
                None
            }
        }
    }
}
