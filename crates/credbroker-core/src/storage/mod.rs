//! Vault backends and the capability interface the broker consumes
//!
//! This module provides:
//! 1. The `Vault` trait with item references released through `ItemGuard`
//! 2. OS keychain vault (production)
//! 3. In-memory vault (tests)
//! 4. Translation of vault status codes into broker errors

mod keychain;
mod memory;
mod status;
mod traits;
pub mod translate;

pub use keychain::{KeyringVault, DEFAULT_INDEX_NAMESPACE};
pub use memory::{MemoryVault, VaultOp};
pub use status::VaultStatus;
pub use traits::{FindOptions, FoundItem, ItemGuard, ItemHandle, Vault, VaultResult};

#[cfg(test)]
pub use traits::MockVault;
