//! In-memory vault for tests
//!
//! Behaves like a keychain: items are keyed by (service, account), several
//! accounts may share one service, and zero matches are reported as
//! `ITEM_NOT_FOUND`. Nothing is persisted.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::{FindOptions, FoundItem, ItemHandle, Vault, VaultResult, VaultStatus};
use crate::credential::SecretString;

/// Vault operation, used to target injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VaultOp {
    QueryCount,
    QueryAccount,
    AddItem,
    FindItem,
    ModifyItem,
    DeleteItem,
}

struct MemoryItem {
    id: u64,
    service: String,
    account: String,
    secret: SecretString,
}

#[derive(Default)]
struct State {
    items: Vec<MemoryItem>,
    /// handle id -> item id
    handles: HashMap<u64, u64>,
    next_id: u64,
    failures: HashMap<VaultOp, VaultStatus>,
    mutations: usize,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn take_failure(&mut self, op: VaultOp) -> VaultResult<()> {
        match self.failures.remove(&op) {
            Some(status) => {
                debug!(?op, code = status.code(), "Injected vault failure");
                Err(status)
            }
            None => Ok(()),
        }
    }

    fn item_for_handle(&mut self, item: &ItemHandle) -> VaultResult<&mut MemoryItem> {
        let item_id = *self
            .handles
            .get(&item.id())
            .ok_or(VaultStatus::INVALID_ITEM_REF)?;
        self.items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(VaultStatus::INVALID_ITEM_REF)
    }
}

/// Thread-safe in-memory vault
#[derive(Default)]
pub struct MemoryVault {
    state: Mutex<State>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed an item without counting it as a mutation.
    ///
    /// Skips every uniqueness check, so two items with the same service and
    /// account can be planted to simulate a corrupted vault.
    pub fn insert_raw(&self, service: &str, account: &str, secret: &str) {
        let mut state = self.state();
        let id = state.next_id();
        state.items.push(MemoryItem {
            id,
            service: service.to_string(),
            account: account.to_string(),
            secret: SecretString::from(secret),
        });
    }

    /// Make the next call of `op` fail with `status`
    pub fn fail_next(&self, op: VaultOp, status: VaultStatus) {
        self.state().failures.insert(op, status);
    }

    /// Number of items stored for `service`
    pub fn match_count(&self, service: &str) -> usize {
        self.state()
            .items
            .iter()
            .filter(|i| i.service == service)
            .count()
    }

    /// Item references handed out and not yet released
    pub fn outstanding_handles(&self) -> usize {
        self.state().handles.len()
    }

    /// Number of successful add, modify and delete calls
    pub fn mutations(&self) -> usize {
        self.state().mutations
    }
}

impl Vault for MemoryVault {
    fn query_count(&self, service: &str) -> VaultResult<usize> {
        let mut state = self.state();
        state.take_failure(VaultOp::QueryCount)?;

        match state.items.iter().filter(|i| i.service == service).count() {
            0 => Err(VaultStatus::ITEM_NOT_FOUND),
            n => Ok(n),
        }
    }

    fn query_account(&self, service: &str) -> VaultResult<String> {
        let mut state = self.state();
        state.take_failure(VaultOp::QueryAccount)?;

        state
            .items
            .iter()
            .find(|i| i.service == service)
            .map(|i| i.account.clone())
            .ok_or(VaultStatus::ITEM_NOT_FOUND)
    }

    fn add_item(&self, service: &str, account: &str, secret: &str) -> VaultResult<()> {
        let mut state = self.state();
        state.take_failure(VaultOp::AddItem)?;

        if state
            .items
            .iter()
            .any(|i| i.service == service && i.account == account)
        {
            return Err(VaultStatus::DUPLICATE_ITEM);
        }

        let id = state.next_id();
        state.items.push(MemoryItem {
            id,
            service: service.to_string(),
            account: account.to_string(),
            secret: SecretString::from(secret),
        });
        state.mutations += 1;
        Ok(())
    }

    fn find_item(
        &self,
        service: &str,
        account: &str,
        options: FindOptions,
    ) -> VaultResult<FoundItem> {
        let mut state = self.state();
        state.take_failure(VaultOp::FindItem)?;

        let (item_id, secret) = state
            .items
            .iter()
            .find(|i| i.service == service && i.account == account)
            .map(|i| (i.id, i.secret.expose().to_string()))
            .ok_or(VaultStatus::ITEM_NOT_FOUND)?;

        let item = if options.reference {
            let handle_id = state.next_id();
            state.handles.insert(handle_id, item_id);
            Some(ItemHandle::new(handle_id))
        } else {
            None
        };

        Ok(FoundItem {
            secret: options.secret.then(|| SecretString::new(secret)),
            item,
        })
    }

    fn modify_item(&self, item: &ItemHandle, account: &str, secret: &str) -> VaultResult<()> {
        let mut state = self.state();
        state.take_failure(VaultOp::ModifyItem)?;

        let stored = state.item_for_handle(item)?;
        stored.account = account.to_string();
        stored.secret = SecretString::from(secret);
        state.mutations += 1;
        Ok(())
    }

    fn delete_item(&self, item: &ItemHandle) -> VaultResult<()> {
        let mut state = self.state();
        state.take_failure(VaultOp::DeleteItem)?;

        let item_id = state.item_for_handle(item)?.id;
        state.items.retain(|i| i.id != item_id);
        state.mutations += 1;
        Ok(())
    }

    fn release(&self, item: ItemHandle) {
        if self.state().handles.remove(&item.id()).is_none() {
            warn!(item = item.id(), "Released an unknown item reference");
        }
    }

    fn status_message(&self, _status: VaultStatus) -> Option<String> {
        None
    }

    fn backend_name(&self) -> &'static str {
        "In-memory vault"
    }
}
