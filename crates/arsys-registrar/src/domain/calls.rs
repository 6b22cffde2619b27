//! Single-call domain operations: availability and transfer checks, glue
//! records, DNSSEC, listings and mail resends.

use arsys_error::RegistrarError;
use serde_json::Value;

use super::types::{FOA_CONTACTS, LIST_INFO_TYPES, OWNER_VERIFICATION};
use super::{domain_path, merged, DomainRef, Domains};
use crate::params::{Args, FieldType, ParamSpec, RequestParams, DOMAIN, DOMAIN_ID};
use crate::response::Envelope;
use crate::transport::Method;

const DOMAIN_NAME: ParamSpec = ParamSpec::required("domain", FieldType::DomainName);

const REFERENCE_ROWS: [ParamSpec; 2] = [DOMAIN, DOMAIN_ID];

const TRANSFER_RESTART_ROWS: [ParamSpec; 4] = [
    DOMAIN,
    DOMAIN_ID,
    ParamSpec::optional("authcode", FieldType::Text),
    ParamSpec::optional("foacontact", FieldType::OneOf(FOA_CONTACTS)),
];

const GLUE_RECORD_ROWS: [ParamSpec; 5] = [
    DOMAIN,
    DOMAIN_ID,
    ParamSpec::required("name", FieldType::Text),
    ParamSpec::required("ipv4", FieldType::Ipv4),
    ParamSpec::optional("ipv6", FieldType::Ipv6),
];

const GLUE_RECORD_DELETE_ROWS: [ParamSpec; 3] = [
    DOMAIN,
    DOMAIN_ID,
    ParamSpec::required("name", FieldType::Text),
];

const LIST_ROWS: [ParamSpec; 11] = [
    ParamSpec::optional("pageLength", FieldType::Integer),
    ParamSpec::optional("page", FieldType::Integer),
    ParamSpec::optional("domain", FieldType::DomainName),
    ParamSpec::optional("word", FieldType::Text),
    ParamSpec::optional("tld", FieldType::Text),
    ParamSpec::optional("renewable", FieldType::Boolean),
    ParamSpec::optional("infoType", FieldType::OneOf(LIST_INFO_TYPES)),
    ParamSpec::optional("owner", FieldType::Text),
    ParamSpec::optional("tag", FieldType::Text),
    ParamSpec::optional("status", FieldType::Text),
    ParamSpec::optional("ownerverification", FieldType::OneOf(OWNER_VERIFICATION)),
];

const DNSSEC_CREATE_ROWS: [ParamSpec; 6] = [
    DOMAIN,
    DOMAIN_ID,
    ParamSpec::required("keytag", FieldType::Integer),
    ParamSpec::required("algorithm", FieldType::Integer),
    ParamSpec::required("digesttype", FieldType::Integer),
    ParamSpec::required("digest", FieldType::Text),
];

const DNSSEC_DELETE_ROWS: [ParamSpec; 7] = [
    DOMAIN,
    DOMAIN_ID,
    ParamSpec::required("name", FieldType::Text),
    ParamSpec::required("keytag", FieldType::Integer),
    ParamSpec::required("algorithm", FieldType::Integer),
    ParamSpec::required("digesttype", FieldType::Integer),
    ParamSpec::required("digest", FieldType::Text),
];

const PAGE_ROWS: [ParamSpec; 2] = [
    ParamSpec::optional("pageLength", FieldType::Integer),
    ParamSpec::optional("page", FieldType::Integer),
];

const HISTORY_ROWS: [ParamSpec; 4] = [
    DOMAIN,
    DOMAIN_ID,
    ParamSpec::optional("pageLength", FieldType::Integer),
    ParamSpec::optional("page", FieldType::Integer),
];

const SUGGEST_ROWS: [ParamSpec; 1] = [ParamSpec::required("sld", FieldType::Text)];

impl Domains {
    /// Validated GET against `domain`'s reference args merged with `args`.
    async fn referenced(
        &self,
        path: &str,
        spec: &[ParamSpec],
        domain: &str,
        args: &Args,
    ) -> Result<Envelope, RegistrarError> {
        let reference = DomainRef::resolve(domain)?;
        self.client
            .execute_checked(path, spec, &merged(&reference, args), Method::Get)
            .await
    }

    async fn by_name(&self, path: &str, domain: &str) -> Result<Envelope, RegistrarError> {
        let mut args = Args::new();
        args.insert("domain".into(), Value::from(domain.trim()));
        self.client
            .execute_checked(path, &[DOMAIN_NAME], &args, Method::Get)
            .await
    }

    /// Registration protection status of `domain`.
    pub async fn check(&self, domain: &str) -> Result<Envelope, RegistrarError> {
        let reference = DomainRef::resolve(domain)?;
        self.client
            .execute(
                &domain_path(&reference, "domain_protection"),
                RequestParams::new(),
                Method::Get,
            )
            .await
    }

    pub async fn check_for_transfer(&self, domain: &str) -> Result<Envelope, RegistrarError> {
        self.by_name("domain/checkfortransfer/", domain).await
    }

    pub async fn whois(&self, domain: &str) -> Result<Envelope, RegistrarError> {
        self.by_name("domain/whois/", domain).await
    }

    /// Restart a transfer, optionally with a new `authcode` and the
    /// `foacontact` (`owner` or `admin`) that receives the authorization mail.
    pub async fn transfer_restart(&self, domain: &str, args: &Args) -> Result<Envelope, RegistrarError> {
        self.referenced("domain/transferrestart/", &TRANSFER_RESTART_ROWS, domain, args)
            .await
    }

    pub async fn glue_record_create(&self, domain: &str, args: &Args) -> Result<Envelope, RegistrarError> {
        self.referenced("domain/gluerecordcreate/", &GLUE_RECORD_ROWS, domain, args)
            .await
    }

    pub async fn glue_record_update(&self, domain: &str, args: &Args) -> Result<Envelope, RegistrarError> {
        self.referenced("domain/gluerecordupdate/", &GLUE_RECORD_ROWS, domain, args)
            .await
    }

    pub async fn glue_record_delete(&self, domain: &str, args: &Args) -> Result<Envelope, RegistrarError> {
        self.referenced("domain/gluerecorddelete/", &GLUE_RECORD_DELETE_ROWS, domain, args)
            .await
    }

    pub async fn get_glue_records(&self, domain: &str) -> Result<Envelope, RegistrarError> {
        self.referenced("domain/getgluerecords/", &REFERENCE_ROWS, domain, &Args::new())
            .await
    }

    pub async fn get_dnssec(&self, domain: &str) -> Result<Envelope, RegistrarError> {
        self.referenced("domain/getdnssec/", &REFERENCE_ROWS, domain, &Args::new())
            .await
    }

    pub async fn dnssec_create(&self, domain: &str, args: &Args) -> Result<Envelope, RegistrarError> {
        self.referenced("domain/dnsseccreate/", &DNSSEC_CREATE_ROWS, domain, args)
            .await
    }

    pub async fn dnssec_delete(&self, domain: &str, args: &Args) -> Result<Envelope, RegistrarError> {
        self.referenced("domain/dnssecdelete/", &DNSSEC_DELETE_ROWS, domain, args)
            .await
    }

    /// Account domain listing with optional filters and paging.
    pub async fn list(&self, args: &Args) -> Result<Envelope, RegistrarError> {
        self.client
            .execute_checked("domain/list/", &LIST_ROWS, args, Method::Get)
            .await
    }

    pub async fn list_deleted(&self, args: &Args) -> Result<Envelope, RegistrarError> {
        self.client
            .execute_checked("domain/listdeleted/", &PAGE_ROWS, args, Method::Get)
            .await
    }

    pub async fn history(&self, domain: &str, args: &Args) -> Result<Envelope, RegistrarError> {
        self.referenced("domain/gethistory/", &HISTORY_ROWS, domain, args)
            .await
    }

    pub async fn resend_verification_mail(&self, domain: &str) -> Result<Envelope, RegistrarError> {
        self.referenced("domain/resendverificationmail/", &REFERENCE_ROWS, domain, &Args::new())
            .await
    }

    pub async fn resend_foa_mail(&self, domain: &str) -> Result<Envelope, RegistrarError> {
        self.referenced("domain/resendfoamail/", &REFERENCE_ROWS, domain, &Args::new())
            .await
    }

    pub async fn reset_foa(&self, domain: &str) -> Result<Envelope, RegistrarError> {
        self.referenced("domain/resetfoa/", &REFERENCE_ROWS, domain, &Args::new())
            .await
    }

    /// Available names close to `sld`.
    pub async fn suggest(&self, sld: &str) -> Result<Envelope, RegistrarError> {
        let mut args = Args::new();
        args.insert("sld".into(), Value::from(sld.trim()));
        self.client
            .execute_checked("domains/check_availability", &SUGGEST_ROWS, &args, Method::Get)
            .await
    }

    /// The provider does not hand out authcodes through the API. The result
    /// is an undecodable, empty envelope, which is an error when the client
    /// throws.
    pub async fn get_auth_code(&self, _domain: &str) -> Result<Envelope, RegistrarError> {
        let envelope = Envelope::decode("");
        envelope.read_response(self.client.throws())?;
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiClient;
    use crate::config::{ClientOptions, Credentials};
    use crate::test_support::{MockTransport, StaticResolver};
    use serde_json::json;

    fn domains(mock: &MockTransport, throw: bool) -> Domains {
        let client = ApiClient::new(
            Box::new(mock.clone()),
            ClientOptions::new("https://api.test").throwing(throw),
            Credentials::new("token", ""),
        );
        Domains::new(client, Box::new(StaticResolver::default()))
    }

    fn args(value: Value) -> Args {
        value.as_object().cloned().expect("object literal")
    }

    #[tokio::test]
    async fn glue_record_by_id_requires_name_and_ipv4() {
        let mock = MockTransport::new();
        mock.respond(Method::Get, "domain/gluerecordcreate/", r#"{"success":true}"#);
        let log = mock.log();
        let domains = domains(&mock, false);

        let err = domains
            .glue_record_create("55123", &args(json!({"name": "ns1"})))
            .await
            .expect_err("ipv4 missing");
        assert!(matches!(err, RegistrarError::Validation(ref e) if e.field == "ipv4"));

        domains
            .glue_record_create("55123", &args(json!({"name": "ns1", "ipv4": "192.0.2.1"})))
            .await
            .expect("created");
        let sent = log.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            Value::Object(sent[0].params.clone()),
            json!({"domainID": "55123", "name": "ns1", "ipv4": "192.0.2.1"})
        );
    }

    #[tokio::test]
    async fn dnssec_create_coerces_integers() {
        let mock = MockTransport::new();
        mock.respond(Method::Get, "domain/dnsseccreate/", r#"{"success":true}"#);
        let log = mock.log();

        domains(&mock, false)
            .dnssec_create(
                "example.es",
                &args(json!({"keytag": "2371", "algorithm": 13, "digesttype": "2", "digest": "AB12"})),
            )
            .await
            .expect("created");
        let params = &log.requests()[0].params;
        assert_eq!(params.get("keytag"), Some(&json!(2371)));
        assert_eq!(params.get("digesttype"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn transfer_restart_checks_foa_contact() {
        let mock = MockTransport::new();
        let err = domains(&mock, false)
            .transfer_restart("example.es", &args(json!({"foacontact": "tech"})))
            .await
            .expect_err("invalid contact");
        assert!(matches!(err, RegistrarError::Validation(_)));
    }

    #[tokio::test]
    async fn list_drops_unknown_filters() {
        let mock = MockTransport::new();
        mock.respond(Method::Get, "domain/list/", r#"{"totalRecords":0,"data":[]}"#);
        let log = mock.log();

        domains(&mock, false)
            .list(&args(json!({"page": 2, "tld": "es", "colour": "blue"})))
            .await
            .expect("listed");
        assert_eq!(
            Value::Object(log.requests()[0].params.clone()),
            json!({"page": 2, "tld": "es"})
        );
    }

    #[tokio::test]
    async fn whois_requires_a_name() {
        let mock = MockTransport::new();
        let err = domains(&mock, false).whois("55123").await.expect_err("not a name");
        assert!(matches!(err, RegistrarError::Validation(_)));
    }

    #[tokio::test]
    async fn check_hits_protection_endpoint() {
        let mock = MockTransport::new();
        mock.respond(
            Method::Get,
            "domains/example.es/domain_protection",
            r#"{"protected":false}"#,
        );
        let envelope = domains(&mock, false).check("example.es").await.expect("checked");
        assert_eq!(envelope.get("protected"), Some(&json!(false)));
    }

    #[tokio::test]
    async fn suggest_wraps_array_results() {
        let mock = MockTransport::new();
        mock.respond(
            Method::Get,
            "domains/check_availability",
            r#"[{"domain":"example.es","available":true}]"#,
        );
        let envelope = domains(&mock, false).suggest("example").await.expect("suggested");
        assert_eq!(
            envelope.get("items").and_then(Value::as_array).map(Vec::len),
            Some(1)
        );
    }

    #[tokio::test]
    async fn auth_code_is_unknown() {
        let mock = MockTransport::new();
        let envelope = domains(&mock, false)
            .get_auth_code("example.es")
            .await
            .expect("envelope");
        assert_eq!(envelope.success(), None);

        let err = domains(&mock, true)
            .get_auth_code("example.es")
            .await
            .expect_err("raised");
        assert!(matches!(err, RegistrarError::InvalidResponse { .. }));
    }
}
