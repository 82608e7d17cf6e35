//! Error types for credbroker-core

use std::fmt;

use thiserror::Error;

/// Result type alias for broker operations
pub type Result<T> = std::result::Result<T, BrokerError>;

/// Caller-supplied field that failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Service,
    Username,
    Secret,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Service => "service name",
            Field::Username => "user name",
            Field::Secret => "password",
        };
        f.write_str(name)
    }
}

/// Coarse classification of a vault status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultErrorKind {
    /// No item matched the query
    NotFound,
    /// An item with the same service and account already exists
    Duplicate,
    /// The user or the platform refused access to the item
    AccessDenied,
    /// The vault itself could not be reached
    Unavailable,
    /// An item reference was stale or unknown to the vault
    InvalidReference,
    Other,
}

/// Non-success status reported by the vault, with its translated message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (code {code})")]
pub struct VaultError {
    /// Raw vault status code
    pub code: i32,
    pub kind: VaultErrorKind,
    /// Human-readable diagnostic
    pub message: String,
}

/// Semantic error kind, as seen by callers of the broker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    AlreadyExists,
    NotFound,
    Vault,
}

/// Broker error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    #[error("Invalid {0}.")]
    InvalidArgument(Field),

    #[error("The item to be stored is already present: {service}")]
    AlreadyExists { service: String },

    #[error("No credential found for {service} (expected 1 match, found {matches})")]
    NotFound { service: String, matches: usize },

    #[error("Did not find 1, but {count} matches for {service}")]
    AmbiguousOrMissing { service: String, count: usize },

    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),
}

impl BrokerError {
    /// Kind reported to callers. `AmbiguousOrMissing` surfaces as `NotFound`.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BrokerError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            BrokerError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            BrokerError::NotFound { .. } | BrokerError::AmbiguousOrMissing { .. } => {
                ErrorKind::NotFound
            }
            BrokerError::Vault(_) => ErrorKind::Vault,
        }
    }

    /// Vault status code, if the failure came from the vault
    pub fn vault_code(&self) -> Option<i32> {
        match self {
            BrokerError::Vault(e) => Some(e.code),
            _ => None,
        }
    }
}

/// Settings error types
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Could not determine configuration directory")]
    NoConfigDir,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_messages() {
        assert_eq!(
            BrokerError::InvalidArgument(Field::Service).to_string(),
            "Invalid service name."
        );
        assert_eq!(
            BrokerError::InvalidArgument(Field::Username).to_string(),
            "Invalid user name."
        );
        assert_eq!(
            BrokerError::InvalidArgument(Field::Secret).to_string(),
            "Invalid password."
        );
    }

    #[test]
    fn test_ambiguity_reports_not_found_kind() {
        let err = BrokerError::AmbiguousOrMissing {
            service: "example.com".to_string(),
            count: 2,
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("2 matches"));
    }

    #[test]
    fn test_vault_error_carries_code() {
        let err: BrokerError = VaultError {
            code: -25293,
            kind: VaultErrorKind::AccessDenied,
            message: "Authorization failed.".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Vault);
        assert_eq!(err.vault_code(), Some(-25293));
        assert_eq!(
            err.to_string(),
            "Vault error: Authorization failed. (code -25293)"
        );
    }
}
