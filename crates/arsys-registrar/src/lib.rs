//! Client for the Arsys domain registration API.
//!
//! The crate is layered:
//!
//! * [`params`] turns loose call arguments into validated request bodies.
//! * [`transport`] sends them; [`client::ApiClient`] ties validation,
//!   transport and decoding together.
//! * [`response::Envelope`] decodes every reply and maps provider error codes
//!   onto [`arsys_error::ErrorKind`].
//! * [`domain::Domains`] runs the domain lifecycle workflows on top.
//!
//! ```no_run
//! # async fn run() -> Result<(), arsys_registrar::RegistrarError> {
//! use arsys_registrar::{ClientOptions, Credentials, Domains};
//!
//! let options = ClientOptions::new("https://api.example.net/v2").throwing(true);
//! let domains = Domains::connect(options, Credentials::new("token", ""))?;
//! let info = domains.get_info("example.es", &Default::default()).await?;
//! println!("{}", info.to_json());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod contact;
pub mod domain;
pub mod output;
pub mod params;
pub mod resolver;
pub mod response;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use arsys_error::{ApiError, ErrorKind, RegistrarError, ValidationError};
pub use client::ApiClient;
pub use config::{ClientOptions, Credentials};
pub use contact::{ContactDescriptor, ContactRole};
pub use domain::{DomainRef, Domains, InfoType, Operation, OperationOutput};
pub use output::{OutputFilter, OutputRegistry};
pub use params::{validate, Args, FieldType, ParamSpec, RequestParams};
pub use resolver::{HostResolver, SystemResolver};
pub use response::Envelope;
pub use transport::{HttpTransport, Method, Transport, TransportError};
