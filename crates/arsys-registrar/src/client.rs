//! Low-level API client: validate, send, decode.

use arsys_error::RegistrarError;
use serde_json::json;
use tracing::warn;

use crate::config::{ClientOptions, Credentials};
use crate::params::{validate, Args, ParamSpec, RequestParams};
use crate::response::Envelope;
use crate::transport::{ApiRequest, HttpTransport, Method, Transport};

pub struct ApiClient {
    transport: Box<dyn Transport>,
    options: ClientOptions,
    credentials: Credentials,
}

impl ApiClient {
    pub fn new(
        transport: Box<dyn Transport>,
        options: ClientOptions,
        credentials: Credentials,
    ) -> Self {
        Self {
            transport,
            options,
            credentials,
        }
    }

    /// Client over the `reqwest` transport.
    pub fn connect(options: ClientOptions, credentials: Credentials) -> Result<Self, RegistrarError> {
        let transport = HttpTransport::new(&options)?;
        Ok(Self::new(Box::new(transport), options, credentials))
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn throws(&self) -> bool {
        self.options.throw_exceptions
    }

    /// Send already-built parameters.
    ///
    /// A transport failure is raised when the client throws; otherwise it is
    /// folded into a `success: false` envelope carrying the transport code.
    /// Error envelopes are raised or returned on the same switch.
    pub async fn execute(
        &self,
        path: &str,
        params: RequestParams,
        method: Method,
    ) -> Result<Envelope, RegistrarError> {
        let request = ApiRequest::new(path, params, method, &self.credentials.api_user);
        let raw = match self.transport.execute(request).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(path, code = err.code, error = %err.message, "transport failure");
                if self.throws() {
                    return Err(err.into());
                }
                json!({
                    "success": false,
                    "action": path.trim_end_matches('/'),
                    "errorCode": err.code,
                    "errorCodeMsg": err.message,
                })
                .to_string()
            }
        };

        let envelope = Envelope::decode(raw);
        envelope.read_response(self.throws())?;
        Ok(envelope)
    }

    /// Validate `args` against `spec`, then send.
    pub async fn execute_checked(
        &self,
        path: &str,
        spec: &[ParamSpec],
        args: &Args,
        method: Method,
    ) -> Result<Envelope, RegistrarError> {
        let params = validate(spec, args)?;
        self.execute(path, params, method).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{FieldType, DOMAIN, DOMAIN_ID};
    use crate::test_support::MockTransport;
    use crate::transport::codes;
    use arsys_error::ErrorKind;
    use serde_json::Value;

    fn client(transport: MockTransport, throw: bool) -> ApiClient {
        ApiClient::new(
            Box::new(transport),
            ClientOptions::new("https://api.test").throwing(throw),
            Credentials::new("token", "secret"),
        )
    }

    #[tokio::test]
    async fn transport_failure_is_synthesized_when_not_throwing() {
        let mock = MockTransport::new();
        mock.fail(Method::Get, "domain/whois/", codes::TIMEOUT, "Operation timed out");
        let client = client(mock, false);

        let envelope = client
            .execute("domain/whois/", RequestParams::new(), Method::Get)
            .await
            .expect("synthesized envelope");
        assert_eq!(envelope.success(), Some(false));
        assert_eq!(envelope.action(), Some("domain/whois"));
        assert_eq!(envelope.error_code(), Some("28"));
        assert_eq!(envelope.error_code_msg(), Some("Operation timed out"));
    }

    #[tokio::test]
    async fn transport_failure_is_raised_when_throwing() {
        let mock = MockTransport::new();
        mock.fail(Method::Get, "dns/7", codes::CONNECT, "refused");
        let client = client(mock, true);

        let err = client
            .execute("dns/7", RequestParams::new(), Method::Get)
            .await
            .expect_err("raised");
        assert!(matches!(err, RegistrarError::Transport { code: 7, .. }));
    }

    #[tokio::test]
    async fn error_envelope_raises_typed_error() {
        let mock = MockTransport::new();
        mock.respond(
            Method::Post,
            "contacts",
            r#"{"success":false,"errorCode":"2010","messages":["taken"]}"#,
        );
        let client = client(mock, true);

        let err = client
            .execute("contacts", RequestParams::new(), Method::Post)
            .await
            .expect_err("raised");
        assert_eq!(err.kind(), Some(ErrorKind::DomainTaken));
    }

    #[tokio::test]
    async fn checked_call_sends_validated_body_with_token() {
        let mock = MockTransport::new();
        mock.respond(Method::Get, "domain/gethistory/", r#"{"history":[]}"#);
        let log = mock.log();
        let client = client(mock, false);

        let spec = [
            DOMAIN,
            DOMAIN_ID,
            ParamSpec::optional("page", FieldType::Integer),
        ];
        let args = serde_json::json!({"domain": "Example.ES", "page": "2", "apiuser": "x"});
        client
            .execute_checked(
                "domain/gethistory/",
                &spec,
                args.as_object().expect("object"),
                Method::Get,
            )
            .await
            .expect("ok");

        let sent = log.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].credential, "token");
        assert_eq!(sent[0].params.get("domain"), Some(&Value::from("example.es")));
        assert_eq!(sent[0].params.get("page"), Some(&Value::from(2)));
        assert!(!sent[0].params.contains_key("apiuser"));
    }

    #[tokio::test]
    async fn validation_failure_sends_nothing() {
        let mock = MockTransport::new();
        let log = mock.log();
        let client = client(mock, false);

        let err = client
            .execute_checked("domain/getdnssec/", &[DOMAIN, DOMAIN_ID], &Args::new(), Method::Get)
            .await
            .expect_err("invalid");
        assert!(matches!(err, RegistrarError::Validation(_)));
        assert!(log.requests().is_empty());
    }
}
