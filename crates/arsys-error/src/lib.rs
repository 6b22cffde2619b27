//! Structured error types for the Arsys domain API client.
//!
//! [`ErrorKind`] is the closed taxonomy the provider reports through numeric
//! `errorCode` values; [`RegistrarError`] is what every client call returns.

pub mod error;
pub mod kind;

pub use error::{ApiError, RegistrarError, ValidationError};
pub use kind::{ErrorCategory, ErrorKind, ERROR_CODES};
