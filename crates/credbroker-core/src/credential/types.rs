//! Credential type definitions

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Secret payload read from or written to the vault - zeroed when dropped
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    /// Wrap a secret value
    pub fn new(value: String) -> Self {
        Self { value }
    }

    /// Get the secret value (use carefully)
    pub fn expose(&self) -> &str {
        &self.value
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretString")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// A username and its secret, as fetched for one service.
///
/// Only lives for the duration of a call; the broker never caches it.
#[derive(Debug)]
pub struct Credential {
    pub username: String,
    pub secret: SecretString,
}

impl Credential {
    pub fn new(username: String, secret: SecretString) -> Self {
        Self { username, secret }
    }
}
