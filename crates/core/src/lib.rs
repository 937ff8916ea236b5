//! Snip Core - Content-addressed storage primitives for snapshot pruning
//!
//! This crate provides the storage layer the pruning engine runs against:
//! - BLAKE3 object identifiers
//! - Tree and commit objects with canonical encodings
//! - Blob storage with compression
//! - The `ObjectStore` / `Publisher` traits and their implementations
//!   (on-disk, in-memory, write-buffering overlay)
//! - Directory import and tree walking helpers

pub mod blob;
pub mod commit;
pub mod error;
pub mod hash;
pub mod memory;
pub mod overlay;
pub mod snapshot;
pub mod store;
pub mod tree;

// Re-export main types for convenience
pub use blob::{Blob, BlobHeaderV1, BlobStore};
pub use commit::{Commit, Signature};
pub use error::{ObjectKind, StoreError};
pub use hash::{hash_bytes, Blake3Hash};
pub use memory::{MemoryStore, StoreCounts};
pub use overlay::Overlay;
pub use store::{normalize_path, ObjectStore, Publisher, Store};
pub use tree::{EntryKind, Tree, TreeEntry};

/// Common result type used throughout snip-core
pub type Result<T> = std::result::Result<T, StoreError>;
