//! # credbroker-core
//!
//! Credential broker over an OS-managed credential vault:
//! - Exactly one (username, secret) pair per service identifier
//! - Store, fetch, update and remove with uniqueness checks before every action
//! - Vault status codes translated into a typed error taxonomy
//! - Item references released on every exit path, secrets zeroed on drop

pub mod credential;
pub mod error;
pub mod settings;
pub mod storage;

pub use credential::{Credential, CredentialStore, Matcher, SecretString};
pub use error::{BrokerError, ErrorKind, Field, Result, SettingsError, VaultError, VaultErrorKind};
pub use settings::{Settings, SettingsManager};
pub use storage::{KeyringVault, MemoryVault, Vault, VaultOp, VaultStatus};
