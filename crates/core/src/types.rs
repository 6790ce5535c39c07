//! Core types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-chosen correlation token binding a proposal to its confirmation.
pub type Nonce = u32;

/// Unsigned value amount moved by a forward.
pub type Amount = u128;

/// Opaque handle for a principal or a value destination.
///
/// Equality is the only meaning a handle carries. Membership in the
/// principal registry is what makes a handle a principal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    /// Create a handle from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive a handle from public key material (hex BLAKE3 digest).
    pub fn from_public_key(public_key: &[u8]) -> Self {
        Self(hex::encode(blake3::hash(public_key).as_bytes()))
    }

    /// Borrow the underlying string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PrincipalId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for PrincipalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
