//! Commit objects

use crate::error::StoreError;
use crate::hash::{hash_bytes, Blake3Hash};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Author identity recorded on a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
}

impl Signature {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// A commit points a snapshot's root tree at its parent commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Parent commit (None for a root commit)
    pub parent: Option<Blake3Hash>,
    /// Root tree of the snapshot
    pub tree: Blake3Hash,
    pub message: String,
    pub author: Signature,
    /// Timestamp (Unix milliseconds)
    pub ts_unix_ms: u64,
}

impl Commit {
    const MAGIC: [u8; 4] = *b"SNC1";

    /// Serialize with the commit magic prefix
    pub fn serialize(&self) -> Result<Vec<u8>, StoreError> {
        let mut out = Self::MAGIC.to_vec();
        bincode::serialize_into(&mut out, self)?;
        Ok(out)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, StoreError> {
        match bytes.strip_prefix(&Self::MAGIC[..]) {
            Some(body) => Ok(bincode::deserialize(body)?),
            None => Err(StoreError::Corrupt("bad commit magic".to_string())),
        }
    }

    pub fn hash(&self) -> Result<Blake3Hash, StoreError> {
        Ok(hash_bytes(&self.serialize()?))
    }

    /// First line of the message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// Current time in Unix milliseconds
pub fn now_unix_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Commit {
        Commit {
            parent: Some(hash_bytes(b"parent")),
            tree: hash_bytes(b"tree"),
            message: "Pruning Redundant Features: kelvin.adder\n\nbody".to_string(),
            author: Signature::new("Ballet", "dai-lab@mit.edu"),
            ts_unix_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_commit_roundtrip() {
        let commit = sample();
        let bytes = commit.serialize().unwrap();
        assert_eq!(&bytes[..4], b"SNC1");
        assert_eq!(Commit::deserialize(&bytes).unwrap(), commit);
    }

    #[test]
    fn test_commit_hash_covers_fields() {
        let a = sample();
        let mut b = sample();
        b.message.push('!');
        assert_eq!(a.hash().unwrap(), sample().hash().unwrap());
        assert_ne!(a.hash().unwrap(), b.hash().unwrap());
    }

    #[test]
    fn test_bad_magic_rejected() {
        assert!(matches!(
            Commit::deserialize(b"SNT1...."),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn test_summary_and_signature_display() {
        let commit = sample();
        assert_eq!(commit.summary(), "Pruning Redundant Features: kelvin.adder");
        assert_eq!(commit.author.to_string(), "Ballet <dai-lab@mit.edu>");
    }
}
