//! Content hashes
//!
//! Every object in the store is named by the BLAKE3 digest of its encoded
//! bytes. Hex is always written lowercase; parsing accepts either case.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 32-byte BLAKE3 digest naming a stored object
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Blake3Hash([u8; 32]);

impl Blake3Hash {
    /// Hex digits kept by [`Blake3Hash::short`]
    pub const SHORT_LEN: usize = 12;

    /// Hex digits in a full hash
    pub const HEX_LEN: usize = 64;

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Prefix used in human-facing output
    pub fn short(&self) -> String {
        self.to_hex()[..Self::SHORT_LEN].to_string()
    }

    pub fn from_hex(text: &str) -> Result<Self, StoreError> {
        if text.len() != Self::HEX_LEN {
            return Err(StoreError::InvalidHash(format!(
                "'{}' is {} characters, want {}",
                text,
                text.len(),
                Self::HEX_LEN
            )));
        }
        let mut digest = [0u8; 32];
        hex::decode_to_slice(text, &mut digest)
            .map_err(|e| StoreError::InvalidHash(format!("'{}': {}", text, e)))?;
        Ok(Self(digest))
    }
}

impl FromStr for Blake3Hash {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for Blake3Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Blake3Hash").field(&self.short()).finish()
    }
}

impl fmt::Display for Blake3Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Digest of an in-memory buffer
pub fn hash_bytes(data: &[u8]) -> Blake3Hash {
    Blake3Hash(*blake3::hash(data).as_bytes())
}
