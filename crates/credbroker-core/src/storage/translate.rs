//! Translation of vault status codes into broker errors

use tracing::warn;

use super::{Vault, VaultStatus};
use crate::error::{VaultError, VaultErrorKind};

/// Built-in diagnostic for a vault status
pub fn describe(status: VaultStatus) -> &'static str {
    match status {
        VaultStatus::SUCCESS => "No error.",
        VaultStatus::IO => "An I/O error occurred while accessing the vault.",
        VaultStatus::PARAM => "One or more parameters passed to the vault were not valid.",
        VaultStatus::USER_CANCELED => "User canceled the operation.",
        VaultStatus::NOT_AVAILABLE => "No keychain is available.",
        VaultStatus::AUTH_FAILED => "The user name or passphrase you entered is not correct.",
        VaultStatus::DUPLICATE_ITEM => "The specified item already exists in the keychain.",
        VaultStatus::ITEM_NOT_FOUND => "The specified item could not be found in the keychain.",
        VaultStatus::INVALID_ITEM_REF => "The specified item is no longer valid.",
        VaultStatus::INTERACTION_NOT_ALLOWED => "User interaction is not allowed.",
        VaultStatus::DECODE => "Unable to decode the provided data.",
        _ => "Unknown vault status.",
    }
}

/// Semantic kind of a vault status
pub fn classify(status: VaultStatus) -> VaultErrorKind {
    match status {
        VaultStatus::ITEM_NOT_FOUND => VaultErrorKind::NotFound,
        VaultStatus::DUPLICATE_ITEM => VaultErrorKind::Duplicate,
        VaultStatus::AUTH_FAILED
        | VaultStatus::USER_CANCELED
        | VaultStatus::INTERACTION_NOT_ALLOWED => VaultErrorKind::AccessDenied,
        VaultStatus::NOT_AVAILABLE => VaultErrorKind::Unavailable,
        VaultStatus::INVALID_ITEM_REF => VaultErrorKind::InvalidReference,
        _ => VaultErrorKind::Other,
    }
}

/// Turn a non-success status into a [`VaultError`].
///
/// The vault's own message wins; the built-in table covers vaults that have
/// none for this status.
pub fn translate(vault: &dyn Vault, status: VaultStatus) -> VaultError {
    let message = vault
        .status_message(status)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| describe(status).to_string());

    warn!(
        code = status.code(),
        backend = vault.backend_name(),
        "Encountered vault error: {}",
        message
    );

    VaultError {
        code: status.code(),
        kind: classify(status),
        message,
    }
}
