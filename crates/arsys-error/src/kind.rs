//! Provider error-code taxonomy.
//!
//! The API reports application failures with a numeric `errorCode`. Each code
//! maps to exactly one [`ErrorKind`]; several codes may share a kind (e.g. the
//! various "account blocked" reasons). The mapping lives in [`ERROR_CODES`] so
//! it can be checked against the published code list; [`ErrorKind::from_code`]
//! is the only place it is consulted.

use serde::{Deserialize, Serialize};

/// Coarse grouping of error kinds, useful for "any authentication failure"
/// style handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Syntax,
    Authentication,
    Account,
    Domain,
    Contact,
    User,
    Service,
    Ssl,
    Generic,
}

/// Typed error kinds reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Undefined,

    SyntaxError,
    SyntaxParameterFault,
    ObjectOrActionNotValid,
    ObjectOrActionNotAllowed,
    ObjectOrActionNotImplemented,
    SyntaxInvalidParameter,

    LoginRequired,
    LoginInvalid,
    SessionInvalid,

    ActionNotAllowed,

    AccountBlocked,
    AccountDeleted,
    AccountInactive,
    AccountNotExists,
    AccountInvalidPass,
    AccountFiltered,
    AccountBanned,
    InsufficientBalance,

    InvalidDomainName,
    TldNotSupported,
    TldUnderMaintenance,
    DomainCheckError,
    TransferNotAllowed,
    WhoisNotAllowed,
    WhoisError,
    DomainNotFound,
    DomainCreateError,
    DomainTaken,
    PremiumDomain,
    TransferError,
    RenewError,
    RenewNotAllowed,
    RenewBlocked,
    UpdateError,
    UpdateNotAllowed,
    UpdateBlocked,
    DomainVerificationStatus,

    ContactNotExists,
    ContactDataError,
    ContactVerificationStatus,

    UserNotExists,
    UserCreateError,
    UserUpdateError,

    ServiceNotFound,
    ServiceEntityNotFound,
    ServiceEntityLimitReached,
    ServiceEntityCreateError,
    ServiceEntityUpdateError,
    ServiceEntityDeleteError,
    ServiceCreateError,
    ServiceUpgradeError,
    ServiceRenewError,
    ServiceParkingUpdateError,

    SslError,
    SslNotFound,

    WebconstructorError,

    /// Catch-all for codes absent from [`ERROR_CODES`].
    Generic,
}

/// Documented `errorCode` values and the kind each one resolves to.
pub const ERROR_CODES: &[(&str, ErrorKind)] = &[
    ("-1", ErrorKind::Validation),
    ("1", ErrorKind::Undefined),
    ("100", ErrorKind::SyntaxError),
    ("101", ErrorKind::SyntaxParameterFault),
    ("102", ErrorKind::ObjectOrActionNotValid),
    ("103", ErrorKind::ObjectOrActionNotAllowed),
    ("104", ErrorKind::ObjectOrActionNotImplemented),
    ("105", ErrorKind::SyntaxInvalidParameter),
    ("200", ErrorKind::LoginRequired),
    ("201", ErrorKind::LoginInvalid),
    ("210", ErrorKind::SessionInvalid),
    ("300", ErrorKind::ActionNotAllowed),
    ("1000", ErrorKind::AccountBlocked),
    ("1001", ErrorKind::AccountDeleted),
    ("1002", ErrorKind::AccountInactive),
    ("1003", ErrorKind::AccountNotExists),
    ("1004", ErrorKind::AccountInvalidPass),
    ("1005", ErrorKind::AccountInvalidPass),
    ("1006", ErrorKind::AccountBlocked),
    ("1007", ErrorKind::AccountFiltered),
    ("1009", ErrorKind::AccountInvalidPass),
    ("1010", ErrorKind::AccountBlocked),
    ("1011", ErrorKind::AccountBlocked),
    ("1012", ErrorKind::AccountBlocked),
    ("1013", ErrorKind::AccountBlocked),
    ("1014", ErrorKind::AccountFiltered),
    ("1030", ErrorKind::AccountBanned),
    ("1100", ErrorKind::InsufficientBalance),
    ("2001", ErrorKind::InvalidDomainName),
    ("2002", ErrorKind::TldNotSupported),
    ("2003", ErrorKind::TldUnderMaintenance),
    ("2004", ErrorKind::DomainCheckError),
    ("2005", ErrorKind::TransferNotAllowed),
    ("2006", ErrorKind::WhoisNotAllowed),
    ("2007", ErrorKind::WhoisError),
    ("2008", ErrorKind::DomainNotFound),
    ("2009", ErrorKind::DomainCreateError),
    ("2010", ErrorKind::DomainTaken),
    ("2011", ErrorKind::PremiumDomain),
    ("2012", ErrorKind::TransferError),
    ("2100", ErrorKind::RenewError),
    ("2101", ErrorKind::RenewNotAllowed),
    ("2102", ErrorKind::RenewBlocked),
    ("2200", ErrorKind::UpdateError),
    ("2201", ErrorKind::UpdateNotAllowed),
    ("2202", ErrorKind::UpdateBlocked),
    ("2210", ErrorKind::DomainVerificationStatus),
    ("3001", ErrorKind::ContactNotExists),
    ("3002", ErrorKind::ContactDataError),
    ("3003", ErrorKind::ContactVerificationStatus),
    ("3500", ErrorKind::UserNotExists),
    ("3501", ErrorKind::UserCreateError),
    ("3502", ErrorKind::UserUpdateError),
    ("4001", ErrorKind::ServiceNotFound),
    ("4002", ErrorKind::ServiceEntityNotFound),
    ("4003", ErrorKind::ServiceEntityLimitReached),
    ("4004", ErrorKind::ServiceEntityCreateError),
    ("4005", ErrorKind::ServiceEntityUpdateError),
    ("4006", ErrorKind::ServiceEntityDeleteError),
    ("4007", ErrorKind::ServiceCreateError),
    ("4008", ErrorKind::ServiceUpgradeError),
    ("4009", ErrorKind::ServiceRenewError),
    ("4010", ErrorKind::ServiceParkingUpdateError),
    ("5000", ErrorKind::SslError),
    ("5001", ErrorKind::SslNotFound),
    ("10001", ErrorKind::WebconstructorError),
];

impl ErrorKind {
    /// Resolve a provider `errorCode` to its kind. Unknown codes map to
    /// [`ErrorKind::Generic`].
    pub fn from_code(code: &str) -> Self {
        let code = code.trim();
        ERROR_CODES
            .iter()
            .find(|(known, _)| *known == code)
            .map(|(_, kind)| *kind)
            .unwrap_or(ErrorKind::Generic)
    }

    pub fn category(self) -> ErrorCategory {
        use ErrorKind::*;
        match self {
            Validation => ErrorCategory::Validation,
            SyntaxError
            | SyntaxParameterFault
            | ObjectOrActionNotValid
            | ObjectOrActionNotAllowed
            | ObjectOrActionNotImplemented
            | SyntaxInvalidParameter => ErrorCategory::Syntax,
            LoginRequired | LoginInvalid | SessionInvalid => ErrorCategory::Authentication,
            AccountBlocked | AccountDeleted | AccountInactive | AccountNotExists
            | AccountInvalidPass | AccountFiltered | AccountBanned | InsufficientBalance => {
                ErrorCategory::Account
            }
            InvalidDomainName | TldNotSupported | TldUnderMaintenance | DomainCheckError
            | TransferNotAllowed | WhoisNotAllowed | WhoisError | DomainNotFound
            | DomainCreateError | DomainTaken | PremiumDomain | TransferError | RenewError
            | RenewNotAllowed | RenewBlocked | UpdateError | UpdateNotAllowed | UpdateBlocked
            | DomainVerificationStatus => ErrorCategory::Domain,
            ContactNotExists | ContactDataError | ContactVerificationStatus => {
                ErrorCategory::Contact
            }
            UserNotExists | UserCreateError | UserUpdateError => ErrorCategory::User,
            ServiceNotFound
            | ServiceEntityNotFound
            | ServiceEntityLimitReached
            | ServiceEntityCreateError
            | ServiceEntityUpdateError
            | ServiceEntityDeleteError
            | ServiceCreateError
            | ServiceUpgradeError
            | ServiceRenewError
            | ServiceParkingUpdateError => ErrorCategory::Service,
            SslError | SslNotFound => ErrorCategory::Ssl,
            // Action/undefined/webconstructor failures have no narrower home.
            ActionNotAllowed | Undefined | WebconstructorError | Generic => ErrorCategory::Generic,
        }
    }

    pub fn is_authentication(self) -> bool {
        self.category() == ErrorCategory::Authentication
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The serde name doubles as the display name.
        let name = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| format!("{:?}", self));
        write!(f, "{}", name)
    }
}
