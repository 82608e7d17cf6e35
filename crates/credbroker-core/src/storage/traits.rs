//! Vault capability interface

use tracing::trace;

use super::VaultStatus;
use crate::credential::SecretString;

/// Result of a single vault call
pub type VaultResult<T> = std::result::Result<T, VaultStatus>;

/// Opaque reference to one credential item, minted by a vault.
///
/// Every handle returned by [`Vault::find_item`] must be passed back to
/// [`Vault::release`] exactly once. The broker only holds handles through an
/// [`ItemGuard`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ItemHandle(u64);

impl ItemHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// What a [`Vault::find_item`] call should hand back
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Return the secret payload
    pub secret: bool,
    /// Return an item reference for a later modify or delete
    pub reference: bool,
}

impl FindOptions {
    pub fn secret() -> Self {
        Self {
            secret: true,
            reference: false,
        }
    }

    pub fn reference() -> Self {
        Self {
            secret: false,
            reference: true,
        }
    }

    pub fn secret_and_reference() -> Self {
        Self {
            secret: true,
            reference: true,
        }
    }
}

/// Payload of a successful [`Vault::find_item`] call
#[derive(Debug, Default)]
pub struct FoundItem {
    pub secret: Option<SecretString>,
    pub item: Option<ItemHandle>,
}

/// Native secure-storage subsystem holding generic credential items.
///
/// Items are keyed by (service, account). A vault does not enforce one item
/// per service; that is the broker's job.
///
/// Production: OS keychain via the `keyring` crate
/// Testing: [`MemoryVault`](super::MemoryVault)
#[cfg_attr(test, mockall::automock)]
pub trait Vault: Send + Sync {
    /// Count the items whose service attribute equals `service`.
    /// A vault may report zero matches as `ITEM_NOT_FOUND`.
    fn query_count(&self, service: &str) -> VaultResult<usize>;

    /// Account attribute of the first item stored for `service`
    fn query_account(&self, service: &str) -> VaultResult<String>;

    /// Add a new item
    fn add_item(&self, service: &str, account: &str, secret: &str) -> VaultResult<()>;

    /// Locate the item stored for (service, account)
    fn find_item(&self, service: &str, account: &str, options: FindOptions)
        -> VaultResult<FoundItem>;

    /// Replace the account attribute and secret payload of an item in place
    fn modify_item(&self, item: &ItemHandle, account: &str, secret: &str) -> VaultResult<()>;

    /// Permanently delete an item
    fn delete_item(&self, item: &ItemHandle) -> VaultResult<()>;

    /// Give an item reference back to the vault
    fn release(&self, item: ItemHandle);

    /// Vault's own diagnostic for a non-success status, if it has one
    fn status_message(&self, status: VaultStatus) -> Option<String>;

    /// Human-readable name for this vault backend
    fn backend_name(&self) -> &'static str;
}

/// Owns an [`ItemHandle`] and releases it when dropped
pub struct ItemGuard<'v> {
    vault: &'v dyn Vault,
    item: ItemHandle,
}

impl<'v> ItemGuard<'v> {
    pub fn new(vault: &'v dyn Vault, item: ItemHandle) -> Self {
        Self { vault, item }
    }

    pub fn handle(&self) -> &ItemHandle {
        &self.item
    }
}

impl Drop for ItemGuard<'_> {
    fn drop(&mut self) {
        trace!(item = self.item.0, "Releasing vault item reference");
        // The guard's own handle is dropped with it and never reused.
        self.vault.release(ItemHandle(self.item.0));
    }
}
