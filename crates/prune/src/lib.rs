//! Selective snapshot pruning
//!
//! Removes an exact set of files from the latest snapshot of a branch and
//! publishes a commit that differs from its parent only by their absence:
//! - `trie`: removal paths as a prefix tree of path segments
//! - `reduce`: lock-step walk of snapshot and trie, rebuilding only the
//!   trees on a path to a removed file
//! - `detect`: no-op detection at the root
//! - `message`: commit message and metadata composition
//! - `prune`: the end-to-end operation against any store

pub mod detect;
pub mod error;
pub mod message;
pub mod prune;
pub mod reduce;
pub mod trie;

// Re-exports
pub use detect::{detect, Change};
pub use error::PruneError;
pub use message::{
    compose_message, default_author, feature_label, validate_template, CommitMessageOptions,
    CommitDraft, DEFAULT_AUTHOR_EMAIL, DEFAULT_AUTHOR_NAME, DEFAULT_TEMPLATE, FEATURES_PLACEHOLDER,
};
pub use prune::{prune, MissingTargets, PruneOptions, PruneOutcome, PruneRequest, Published};
pub use reduce::{reduce, ReduceStats, Reduced, Reducer};
pub use trie::{PathTrie, TrieNode};

/// Result type for pruning operations
pub type Result<T> = std::result::Result<T, PruneError>;
