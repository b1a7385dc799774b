//! Account identity: a raw Ed25519 public key.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte account identifier. Each account owns its own chain in the
/// lattice; the identifier doubles as the Ed25519 key that signs its blocks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Account([u8; 32]);

impl Default for Account {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Account {
    /// The burn account. Funds sent here are destroyed; opening it is illegal.
    pub const ZERO: Self = Self([0u8; 32]);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Reinterpret as a block hash (open roots are account identifiers).
    pub fn as_hash(&self) -> crate::hash::BlockHash {
        crate::hash::BlockHash::new(self.0)
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Account(")?;
        for b in &self.0[..4] {
            write!(f, "{:02x}", b)?;
        }
        write!(f, "\u{2026})")
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}
