//! In-memory store for tests and embedding

use crate::commit::Commit;
use crate::error::{ObjectKind, StoreError};
use crate::hash::{hash_bytes, Blake3Hash};
use crate::store::{ref_conflict, validate_ref_name, ObjectStore, Publisher};
use crate::tree::Tree;
use crate::Result;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Operation counters, so callers can observe how much work a run did
#[derive(Debug, Default)]
struct Counters {
    tree_reads: AtomicUsize,
    tree_writes: AtomicUsize,
    commit_writes: AtomicUsize,
    ref_updates: AtomicUsize,
}

/// Snapshot of [`MemoryStore`] counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub tree_reads: usize,
    pub tree_writes: usize,
    pub commit_writes: usize,
    pub ref_updates: usize,
}

impl StoreCounts {
    /// Total number of mutating calls
    pub fn writes(&self) -> usize {
        self.tree_writes + self.commit_writes + self.ref_updates
    }
}

#[derive(Default)]
pub struct MemoryStore {
    trees: RwLock<HashMap<Blake3Hash, Tree>>,
    commits: RwLock<HashMap<Blake3Hash, Commit>>,
    refs: Mutex<HashMap<String, Blake3Hash>>,
    counters: Counters,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tree without counting it as a write
    pub fn seed_tree(&self, tree: Tree) -> Blake3Hash {
        let hash = tree.hash();
        self.trees.write().insert(hash, tree);
        hash
    }

    /// Point a branch at a commit without counting it as a write
    pub fn seed_ref(&self, branch: &str, commit: &Commit) -> Result<Blake3Hash> {
        validate_ref_name(branch)?;
        let bytes = commit.serialize()?;
        let hash = hash_bytes(&bytes);
        self.commits.write().insert(hash, commit.clone());
        self.refs.lock().insert(branch.to_string(), hash);
        Ok(hash)
    }

    pub fn counts(&self) -> StoreCounts {
        StoreCounts {
            tree_reads: self.counters.tree_reads.load(Ordering::Relaxed),
            tree_writes: self.counters.tree_writes.load(Ordering::Relaxed),
            commit_writes: self.counters.commit_writes.load(Ordering::Relaxed),
            ref_updates: self.counters.ref_updates.load(Ordering::Relaxed),
        }
    }

    pub fn reset_counts(&self) {
        self.counters.tree_reads.store(0, Ordering::Relaxed);
        self.counters.tree_writes.store(0, Ordering::Relaxed);
        self.counters.commit_writes.store(0, Ordering::Relaxed);
        self.counters.ref_updates.store(0, Ordering::Relaxed);
    }

    pub fn tree_count(&self) -> usize {
        self.trees.read().len()
    }
}

impl ObjectStore for MemoryStore {
    fn read_tree(&self, hash: Blake3Hash) -> Result<Tree> {
        self.counters.tree_reads.fetch_add(1, Ordering::Relaxed);
        self.trees
            .read()
            .get(&hash)
            .cloned()
            .ok_or_else(|| StoreError::not_found(ObjectKind::Tree, hash))
    }

    fn write_tree(&self, tree: &Tree) -> Result<Blake3Hash> {
        self.counters.tree_writes.fetch_add(1, Ordering::Relaxed);
        let hash = tree.hash();
        self.trees.write().entry(hash).or_insert_with(|| tree.clone());
        Ok(hash)
    }
}

impl Publisher for MemoryStore {
    fn read_commit(&self, hash: Blake3Hash) -> Result<Commit> {
        self.commits
            .read()
            .get(&hash)
            .cloned()
            .ok_or_else(|| StoreError::not_found(ObjectKind::Commit, hash))
    }

    fn create_commit(&self, commit: &Commit) -> Result<Blake3Hash> {
        self.counters.commit_writes.fetch_add(1, Ordering::Relaxed);
        let hash = commit.hash()?;
        self.commits.write().insert(hash, commit.clone());
        Ok(hash)
    }

    fn resolve_ref(&self, branch: &str) -> Result<Option<Blake3Hash>> {
        validate_ref_name(branch)?;
        Ok(self.refs.lock().get(branch).copied())
    }

    fn update_ref(
        &self,
        branch: &str,
        expected: Option<Blake3Hash>,
        new: Blake3Hash,
    ) -> Result<()> {
        validate_ref_name(branch)?;
        let mut refs = self.refs.lock();
        let actual = refs.get(branch).copied();
        if actual != expected {
            return Err(ref_conflict(branch, expected, actual));
        }
        self.counters.ref_updates.fetch_add(1, Ordering::Relaxed);
        refs.insert(branch.to_string(), new);
        Ok(())
    }
}
