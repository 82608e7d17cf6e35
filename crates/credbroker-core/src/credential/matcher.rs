//! Match counting and username resolution for a service identifier

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{BrokerError, Result, VaultError};
use crate::storage::translate::translate;
use crate::storage::{Vault, VaultStatus};

/// Answers "how many items does this service have" and "whose are they".
///
/// The two queries are issued separately; the vault gives no atomicity
/// between them.
pub struct Matcher {
    vault: Arc<dyn Vault>,
}

impl Matcher {
    pub fn new(vault: Arc<dyn Vault>) -> Self {
        Self { vault }
    }

    /// Count the generic credential items stored for `service`.
    ///
    /// A "not found" status means zero matches, not a failure.
    pub fn count_matches(&self, service: &str) -> std::result::Result<usize, VaultError> {
        match self.vault.query_count(service) {
            Ok(matches) => {
                debug!(service, matches, "Counted vault matches");
                Ok(matches)
            }
            Err(VaultStatus::ITEM_NOT_FOUND) => {
                debug!(service, matches = 0, "Counted vault matches");
                Ok(0)
            }
            Err(status) => Err(translate(self.vault.as_ref(), status)),
        }
    }

    /// Username of the single item stored for `service`.
    ///
    /// Fails with `AmbiguousOrMissing` unless exactly one item matches.
    pub fn resolve_username(&self, service: &str) -> Result<String> {
        let count = self.count_matches(service)?;
        if count != 1 {
            warn!(service, count, "Did not find exactly one matching item");
            return Err(BrokerError::AmbiguousOrMissing {
                service: service.to_string(),
                count,
            });
        }

        self.vault
            .query_account(service)
            .map_err(|status| BrokerError::from(translate(self.vault.as_ref(), status)))
    }
}
