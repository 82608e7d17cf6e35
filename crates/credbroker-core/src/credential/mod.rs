//! Credential values and the broker facade

mod matcher;
mod store;
mod types;

pub use matcher::Matcher;
pub use store::CredentialStore;
pub use types::{Credential, SecretString};
