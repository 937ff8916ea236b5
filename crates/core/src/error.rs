//! Error types for store operations

use crate::hash::Blake3Hash;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Kind of object a store lookup was for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
        };
        f.write_str(name)
    }
}

/// Errors raised by object stores
#[derive(Debug, Error)]
pub enum StoreError {
    /// A referenced hash cannot be resolved
    #[error("{kind} {hash} not found")]
    NotFound { kind: ObjectKind, hash: Blake3Hash },

    /// Stored bytes failed to decode
    #[error("corrupt object: {0}")]
    Corrupt(String),

    /// Compare-and-swap ref update lost a race
    #[error("ref {branch} moved: expected {expected}, found {actual}")]
    RefConflict {
        branch: String,
        expected: String,
        actual: String,
    },

    #[error("invalid ref name: {0:?}")]
    InvalidRef(String),

    #[error("invalid hash: {0}")]
    InvalidHash(String),

    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("not a snip repository (no .snip directory found at or above {})", .0.display())]
    NotInitialized(PathBuf),

    #[error("snip repository already initialized at {}", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Encode(#[from] bincode::Error),
}

impl StoreError {
    pub(crate) fn not_found(kind: ObjectKind, hash: Blake3Hash) -> Self {
        StoreError::NotFound { kind, hash }
    }

    /// True when this error means a referenced object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
