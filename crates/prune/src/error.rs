//! Pruning errors

use snip_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PruneError {
    /// A removal path is empty, malformed, or does not have the shape the
    /// commit message labels are derived from
    #[error("malformed path {path:?}: {reason}")]
    MalformedPath { path: String, reason: String },

    /// Strict mode only: targets absent from the snapshot
    #[error("{} target(s) not found in snapshot: {}", .0.len(), .0.join(", "))]
    TargetsNotFound(Vec<String>),

    #[error("branch {branch:?} has no commits")]
    NoHead { branch: String },

    #[error("invalid message template: {0}")]
    InvalidTemplate(String),

    /// Store failures propagate unchanged
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PruneError {
    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        PruneError::MalformedPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
