//! OS keychain vault
//!
//! Uses the system keychain through the `keyring` crate:
//! - macOS: Keychain
//! - Windows: Credential Manager (DPAPI)
//! - Linux: Secret Service (GNOME Keyring, KWallet)
//!
//! Each credential is one keychain entry keyed by (service, account). The
//! keyring API cannot enumerate entries, so the accounts stored for a service
//! are tracked in an index entry: a JSON array kept under the index namespace,
//! with the service identifier as its account. The namespace itself is
//! therefore not a usable service identifier.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use keyring::Entry;
use tracing::{debug, warn};

use super::{FindOptions, FoundItem, ItemHandle, Vault, VaultResult, VaultStatus};
use crate::credential::SecretString;

/// Default keychain service name holding the per-service account index
pub const DEFAULT_INDEX_NAMESPACE: &str = "credbroker.accounts";

/// Raw keychain entry access, keyed by (service, account)
trait EntryStore: Send + Sync {
    fn get(&self, service: &str, account: &str) -> keyring::Result<String>;
    fn set(&self, service: &str, account: &str, secret: &str) -> keyring::Result<()>;
    fn delete(&self, service: &str, account: &str) -> keyring::Result<()>;
}

/// Entries in the platform keychain
struct OsEntries;

impl EntryStore for OsEntries {
    fn get(&self, service: &str, account: &str) -> keyring::Result<String> {
        Entry::new(service, account)?.get_password()
    }

    fn set(&self, service: &str, account: &str, secret: &str) -> keyring::Result<()> {
        Entry::new(service, account)?.set_password(secret)
    }

    fn delete(&self, service: &str, account: &str) -> keyring::Result<()> {
        Entry::new(service, account)?.delete_password()
    }
}

/// Where an item reference points
#[derive(Debug, Clone)]
struct ItemLocation {
    service: String,
    account: String,
}

/// Vault backed by the OS keychain
pub struct KeyringVault {
    index_namespace: String,
    entries: Arc<dyn EntryStore>,
    handles: Mutex<HashMap<u64, ItemLocation>>,
    next_handle: AtomicU64,
    /// Platform message of the most recent failure in the current call
    last_error: Mutex<Option<(VaultStatus, String)>>,
}

impl KeyringVault {
    /// Create a keychain vault keeping its account index under `index_namespace`
    pub fn new(index_namespace: impl Into<String>) -> Self {
        Self::with_entries(index_namespace, Arc::new(OsEntries))
    }

    fn with_entries(index_namespace: impl Into<String>, entries: Arc<dyn EntryStore>) -> Self {
        Self {
            index_namespace: index_namespace.into(),
            entries,
            handles: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
            last_error: Mutex::new(None),
        }
    }

    fn handles(&self) -> MutexGuard<'_, HashMap<u64, ItemLocation>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn last_error(&self) -> MutexGuard<'_, Option<(VaultStatus, String)>> {
        self.last_error.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a vault call; messages from earlier calls no longer apply
    fn begin(&self) {
        *self.last_error() = None;
    }

    /// Map a keyring failure to a status, remembering its message
    fn fail(&self, err: keyring::Error) -> VaultStatus {
        let status = status_from(&err);
        debug!(code = status.code(), error = %err, "Keychain call failed");
        *self.last_error() = Some((status, err.to_string()));
        status
    }

    fn check_service(&self, service: &str) -> VaultResult<()> {
        if service == self.index_namespace {
            warn!(service, "Service name is reserved for the account index");
            return Err(VaultStatus::PARAM);
        }
        Ok(())
    }

    /// Read an entry, `None` if it does not exist. keyring has no existence
    /// check, so this may trigger an access prompt.
    fn get(&self, service: &str, account: &str) -> VaultResult<Option<SecretString>> {
        match self.entries.get(service, account) {
            Ok(secret) => Ok(Some(SecretString::new(secret))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn set(&self, service: &str, account: &str, secret: &str) -> VaultResult<()> {
        self.entries
            .set(service, account, secret)
            .map_err(|e| self.fail(e))
    }

    fn read_index(&self, service: &str) -> VaultResult<Vec<String>> {
        match self.entries.get(&self.index_namespace, service) {
            Ok(json) => serde_json::from_str(&json).map_err(|e| {
                warn!(service, error = %e, "Corrupt account index");
                VaultStatus::DECODE
            }),
            Err(keyring::Error::NoEntry) => Ok(Vec::new()),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn write_index(&self, service: &str, accounts: &[String]) -> VaultResult<()> {
        if accounts.is_empty() {
            return match self.entries.delete(&self.index_namespace, service) {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(self.fail(e)),
            };
        }

        let json = serde_json::to_string(accounts).map_err(|_| VaultStatus::PARAM)?;
        self.set(&self.index_namespace, service, &json)
    }

    /// Best-effort undo after a failed multi-step write. Errors here must not
    /// replace the status of the step that failed.
    fn roll_back(&self, service: &str, added_account: &str, index: Option<&[String]>) {
        if let Err(e) = self.entries.delete(service, added_account) {
            warn!(service, error = %e, "Could not remove entry during rollback");
        }
        if let Some(accounts) = index {
            let restored = serde_json::to_string(accounts)
                .map_err(|e| e.to_string())
                .and_then(|json| {
                    self.entries
                        .set(&self.index_namespace, service, &json)
                        .map_err(|e| e.to_string())
                });
            if let Err(e) = restored {
                warn!(service, error = %e, "Could not restore account index");
            }
        }
    }

    /// Indexed accounts whose entries still exist
    fn live_accounts(&self, service: &str) -> VaultResult<Vec<String>> {
        let mut live = Vec::new();
        for account in self.read_index(service)? {
            if self.get(service, &account)?.is_some() {
                live.push(account);
            } else {
                debug!(service, account = %account, "Skipping stale index row");
            }
        }
        Ok(live)
    }

    fn mint_handle(&self, location: ItemLocation) -> ItemHandle {
        let id = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.handles().insert(id, location);
        ItemHandle::new(id)
    }

    fn location(&self, item: &ItemHandle) -> VaultResult<ItemLocation> {
        self.handles()
            .get(&item.id())
            .cloned()
            .ok_or(VaultStatus::INVALID_ITEM_REF)
    }

    fn set_location_account(&self, item: &ItemHandle, account: &str) {
        if let Some(location) = self.handles().get_mut(&item.id()) {
            location.account = account.to_string();
        }
    }
}

impl Vault for KeyringVault {
    fn query_count(&self, service: &str) -> VaultResult<usize> {
        self.begin();
        self.check_service(service)?;

        match self.live_accounts(service)?.len() {
            0 => Err(VaultStatus::ITEM_NOT_FOUND),
            n => Ok(n),
        }
    }

    fn query_account(&self, service: &str) -> VaultResult<String> {
        self.begin();
        self.check_service(service)?;

        self.live_accounts(service)?
            .into_iter()
            .next()
            .ok_or(VaultStatus::ITEM_NOT_FOUND)
    }

    fn add_item(&self, service: &str, account: &str, secret: &str) -> VaultResult<()> {
        self.begin();
        self.check_service(service)?;

        let mut accounts = self.read_index(service)?;
        if self.get(service, account)?.is_some() {
            return Err(VaultStatus::DUPLICATE_ITEM);
        }
        if !accounts.iter().any(|a| a == account) {
            accounts.push(account.to_string());
        }

        self.set(service, account, secret)?;
        if let Err(status) = self.write_index(service, &accounts) {
            // An unindexed entry would be invisible to later queries.
            self.roll_back(service, account, None);
            return Err(status);
        }

        debug!(service, "Added keychain entry");
        Ok(())
    }

    fn find_item(
        &self,
        service: &str,
        account: &str,
        options: FindOptions,
    ) -> VaultResult<FoundItem> {
        self.begin();
        self.check_service(service)?;

        let secret = self
            .entries
            .get(service, account)
            .map(SecretString::new)
            .map_err(|e| self.fail(e))?;

        let item = options.reference.then(|| {
            self.mint_handle(ItemLocation {
                service: service.to_string(),
                account: account.to_string(),
            })
        });

        Ok(FoundItem {
            secret: options.secret.then_some(secret),
            item,
        })
    }

    fn modify_item(&self, item: &ItemHandle, account: &str, secret: &str) -> VaultResult<()> {
        self.begin();
        let location = self.location(item)?;

        if location.account == account {
            return self.set(&location.service, account, secret);
        }

        // The account is part of the entry key. Write the new entry and the
        // index first; the old entry goes last so every failure before it
        // leaves the original credential intact and indexed.
        let accounts = self.read_index(&location.service)?;
        if self.get(&location.service, account)?.is_some() {
            return Err(VaultStatus::DUPLICATE_ITEM);
        }

        let mut renamed: Vec<String> = accounts
            .iter()
            .map(|a| {
                if *a == location.account {
                    account.to_string()
                } else {
                    a.clone()
                }
            })
            .collect();
        if !renamed.iter().any(|a| a == account) {
            renamed.push(account.to_string());
        }

        self.set(&location.service, account, secret)?;
        if let Err(status) = self.write_index(&location.service, &renamed) {
            self.roll_back(&location.service, account, None);
            return Err(status);
        }
        if let Err(e) = self.entries.delete(&location.service, &location.account) {
            let status = self.fail(e);
            self.roll_back(&location.service, account, Some(accounts.as_slice()));
            return Err(status);
        }
        self.set_location_account(item, account);

        debug!(service = %location.service, "Renamed keychain entry");
        Ok(())
    }

    fn delete_item(&self, item: &ItemHandle) -> VaultResult<()> {
        self.begin();
        let location = self.location(item)?;

        let mut accounts = self.read_index(&location.service)?;
        self.entries
            .delete(&location.service, &location.account)
            .map_err(|e| self.fail(e))?;

        // A failed index write leaves a stale row, which counting skips.
        accounts.retain(|a| *a != location.account);
        self.write_index(&location.service, &accounts)?;

        debug!(service = %location.service, "Deleted keychain entry");
        Ok(())
    }

    fn release(&self, item: ItemHandle) {
        if self.handles().remove(&item.id()).is_none() {
            warn!(item = item.id(), "Released an unknown item reference");
        }
    }

    fn status_message(&self, status: VaultStatus) -> Option<String> {
        self.last_error()
            .as_ref()
            .filter(|(last, _)| *last == status)
            .map(|(_, message)| message.clone())
    }

    fn backend_name(&self) -> &'static str {
        #[cfg(target_os = "macos")]
        return "macOS Keychain";

        #[cfg(target_os = "windows")]
        return "Windows Credential Manager";

        #[cfg(target_os = "linux")]
        return "Linux Secret Service";

        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        return "System Keychain";
    }
}

impl Default for KeyringVault {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_NAMESPACE)
    }
}

/// Status code for a keyring failure
fn status_from(err: &keyring::Error) -> VaultStatus {
    match err {
        keyring::Error::NoEntry => VaultStatus::ITEM_NOT_FOUND,
        keyring::Error::NoStorageAccess(_) => VaultStatus::AUTH_FAILED,
        keyring::Error::PlatformFailure(_) => VaultStatus::NOT_AVAILABLE,
        keyring::Error::BadEncoding(_) => VaultStatus::DECODE,
        keyring::Error::TooLong(..) | keyring::Error::Invalid(..) => VaultStatus::PARAM,
        keyring::Error::Ambiguous(_) => VaultStatus::DUPLICATE_ITEM,
        #[allow(unreachable_patterns)]
        _ => VaultStatus::IO,
    }
}
