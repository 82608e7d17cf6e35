//! Vault status codes

use std::fmt;

/// Status code returned by a vault call.
///
/// Codes follow the macOS Security framework numbering so every backend
/// reports failures in one space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VaultStatus(i32);

impl VaultStatus {
    pub const SUCCESS: Self = Self(0);
    pub const IO: Self = Self(-36);
    pub const PARAM: Self = Self(-50);
    pub const USER_CANCELED: Self = Self(-128);
    pub const NOT_AVAILABLE: Self = Self(-25291);
    pub const AUTH_FAILED: Self = Self(-25293);
    pub const DUPLICATE_ITEM: Self = Self(-25299);
    pub const ITEM_NOT_FOUND: Self = Self(-25300);
    pub const INVALID_ITEM_REF: Self = Self(-25304);
    pub const INTERACTION_NOT_ALLOWED: Self = Self(-25308);
    pub const DECODE: Self = Self(-26275);

    /// Wrap a raw platform status code
    pub const fn from_code(code: i32) -> Self {
        Self(code)
    }

    /// Raw platform status code
    pub const fn code(self) -> i32 {
        self.0
    }
}

impl fmt::Display for VaultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vault status {}", self.0)
    }
}
