//! Credential store: store, fetch, update and remove one credential per service

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::matcher::Matcher;
use super::types::{Credential, SecretString};
use crate::error::{BrokerError, Field, Result};
use crate::storage::translate::translate;
use crate::storage::{FindOptions, FoundItem, ItemGuard, Vault, VaultStatus};

/// Broker facade over a [`Vault`].
///
/// Keeps at most one item per service identifier. Every operation counts the
/// matching items first and refuses to act on a service with zero (where one
/// is required) or several items.
pub struct CredentialStore {
    vault: Arc<dyn Vault>,
    matcher: Matcher,
}

impl CredentialStore {
    /// Create a credential store over the given vault
    pub fn new(vault: Arc<dyn Vault>) -> Self {
        let matcher = Matcher::new(vault.clone());
        Self { vault, matcher }
    }

    /// Name of the vault backend in use
    pub fn backend_name(&self) -> &'static str {
        self.vault.backend_name()
    }

    /// Store a new credential. Fails if the service already has one.
    pub fn store(&self, service: &str, username: &str, secret: &str) -> Result<()> {
        validate(Field::Service, service)?;
        validate(Field::Username, username)?;
        validate(Field::Secret, secret)?;

        if self.matcher.count_matches(service)? > 0 {
            return Err(BrokerError::AlreadyExists {
                service: service.to_string(),
            });
        }

        self.vault
            .add_item(service, username, secret)
            .map_err(|status| self.vault_error(status))?;

        info!(service, "Stored credential");
        Ok(())
    }

    /// Replace the username and secret of the service's credential in place
    pub fn update(&self, service: &str, username: &str, secret: &str) -> Result<()> {
        validate(Field::Service, service)?;
        validate(Field::Username, username)?;
        validate(Field::Secret, secret)?;

        // The vault keys items by (service, account), so the current account
        // is needed to locate the item.
        let current = self.resolve(service)?;

        let found = match self
            .vault
            .find_item(service, &current, FindOptions::reference())
        {
            Ok(found) => found,
            Err(VaultStatus::ITEM_NOT_FOUND) => {
                warn!(service, "Item vanished between resolve and find");
                return Err(BrokerError::NotFound {
                    service: service.to_string(),
                    matches: 0,
                });
            }
            Err(status) => return Err(self.vault_error(status)),
        };
        let (_, item) = self.acquire(found);
        let item = self.require_item(item)?;

        self.vault
            .modify_item(item.handle(), username, secret)
            .map_err(|status| self.vault_error(status))?;

        info!(service, "Updated credential");
        Ok(())
    }

    /// Fetch the service's username and secret. Read-only.
    pub fn fetch(&self, service: &str) -> Result<Credential> {
        validate(Field::Service, service)?;

        let username = self.resolve(service)?;
        let found = self
            .vault
            .find_item(service, &username, FindOptions::secret())
            .map_err(|status| self.vault_error(status))?;
        let (secret, _item) = self.acquire(found);
        let secret = secret.ok_or_else(|| self.vault_error(VaultStatus::DECODE))?;

        debug!(service, "Fetched credential");
        Ok(Credential::new(username, secret))
    }

    /// Permanently remove the service's credential
    pub fn remove(&self, service: &str) -> Result<()> {
        validate(Field::Service, service)?;

        let username = self.resolve(service)?;

        // Reading the secret makes the vault apply the same access check as
        // a fetch before anything is destroyed.
        let found = self
            .vault
            .find_item(service, &username, FindOptions::secret_and_reference())
            .map_err(|status| self.vault_error(status))?;
        let (secret, item) = self.acquire(found);
        drop(secret);
        let item = self.require_item(item)?;

        self.vault
            .delete_item(item.handle())
            .map_err(|status| self.vault_error(status))?;

        info!(service, "Removed credential");
        Ok(())
    }

    /// Number of items currently stored for `service`
    pub fn match_count(&self, service: &str) -> Result<usize> {
        validate(Field::Service, service)?;
        Ok(self.matcher.count_matches(service)?)
    }

    /// Whether any credential is stored for `service`
    pub fn exists(&self, service: &str) -> Result<bool> {
        Ok(self.match_count(service)? > 0)
    }

    /// Resolve the current username, reporting a non-unique match as `NotFound`
    fn resolve(&self, service: &str) -> Result<String> {
        match self.matcher.resolve_username(service) {
            Err(BrokerError::AmbiguousOrMissing { service, count }) => {
                Err(BrokerError::NotFound {
                    service,
                    matches: count,
                })
            }
            other => other,
        }
    }

    /// Take ownership of everything a find returned
    fn acquire(&self, found: FoundItem) -> (Option<SecretString>, Option<ItemGuard<'_>>) {
        let item = found
            .item
            .map(|handle| ItemGuard::new(self.vault.as_ref(), handle));
        (found.secret, item)
    }

    fn require_item<'v>(&self, item: Option<ItemGuard<'v>>) -> Result<ItemGuard<'v>> {
        item.ok_or_else(|| self.vault_error(VaultStatus::INVALID_ITEM_REF))
    }

    fn vault_error(&self, status: VaultStatus) -> BrokerError {
        translate(self.vault.as_ref(), status).into()
    }
}

/// Reject empty text and interior NUL bytes before touching the vault
fn validate(field: Field, value: &str) -> Result<()> {
    if value.is_empty() || value.contains('\0') {
        return Err(BrokerError::InvalidArgument(field));
    }
    Ok(())
}
