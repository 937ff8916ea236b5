//! Write-buffering overlay over another store
//!
//! Reads fall through to the base store; every write stays in memory, so a
//! full run can be executed against a repository without touching it.

use crate::commit::Commit;
use crate::hash::Blake3Hash;
use crate::store::{ref_conflict, ObjectStore, Publisher};
use crate::tree::Tree;
use crate::Result;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;

pub struct Overlay<'a, S> {
    base: &'a S,
    trees: RwLock<HashMap<Blake3Hash, Tree>>,
    commits: RwLock<HashMap<Blake3Hash, Commit>>,
    refs: Mutex<HashMap<String, Blake3Hash>>,
}

impl<'a, S> Overlay<'a, S> {
    pub fn new(base: &'a S) -> Self {
        Self {
            base,
            trees: RwLock::new(HashMap::new()),
            commits: RwLock::new(HashMap::new()),
            refs: Mutex::new(HashMap::new()),
        }
    }

    /// Number of trees written to the overlay
    pub fn pending_trees(&self) -> usize {
        self.trees.read().len()
    }

    pub fn pending_commits(&self) -> usize {
        self.commits.read().len()
    }
}

impl<'a, S: ObjectStore> ObjectStore for Overlay<'a, S> {
    fn read_tree(&self, hash: Blake3Hash) -> Result<Tree> {
        if let Some(tree) = self.trees.read().get(&hash) {
            return Ok(tree.clone());
        }
        self.base.read_tree(hash)
    }

    fn write_tree(&self, tree: &Tree) -> Result<Blake3Hash> {
        let hash = tree.hash();
        self.trees.write().insert(hash, tree.clone());
        Ok(hash)
    }
}

impl<'a, S: Publisher> Publisher for Overlay<'a, S> {
    fn read_commit(&self, hash: Blake3Hash) -> Result<Commit> {
        if let Some(commit) = self.commits.read().get(&hash) {
            return Ok(commit.clone());
        }
        self.base.read_commit(hash)
    }

    fn create_commit(&self, commit: &Commit) -> Result<Blake3Hash> {
        let hash = commit.hash()?;
        self.commits.write().insert(hash, commit.clone());
        Ok(hash)
    }

    fn resolve_ref(&self, branch: &str) -> Result<Option<Blake3Hash>> {
        if let Some(hash) = self.refs.lock().get(branch) {
            return Ok(Some(*hash));
        }
        self.base.resolve_ref(branch)
    }

    fn update_ref(
        &self,
        branch: &str,
        expected: Option<Blake3Hash>,
        new: Blake3Hash,
    ) -> Result<()> {
        let actual = self.resolve_ref(branch)?;
        if actual != expected {
            return Err(ref_conflict(branch, expected, actual));
        }
        self.refs.lock().insert(branch.to_string(), new);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::Signature;
    use crate::hash::hash_bytes;
    use crate::memory::MemoryStore;
    use crate::tree::TreeEntry;

    #[test]
    fn test_writes_never_reach_base() {
        let base = MemoryStore::new();
        let existing = base.seed_tree(Tree::new());

        let overlay = Overlay::new(&base);
        let tree = Tree::from_entries([TreeEntry::file("a", hash_bytes(b"a"))]).unwrap();
        let hash = overlay.write_tree(&tree).unwrap();

        assert_eq!(overlay.read_tree(hash).unwrap(), tree);
        assert!(overlay.read_tree(existing).unwrap().is_empty());
        assert!(base.read_tree(hash).unwrap_err().is_not_found());
        assert_eq!(overlay.pending_trees(), 1);
        assert_eq!(base.counts().writes(), 0);
    }

    #[test]
    fn test_refs_and_commits_buffered() {
        let base = MemoryStore::new();
        let tree = base.seed_tree(Tree::new());
        let commit = Commit {
            parent: None,
            tree,
            message: "m".to_string(),
            author: Signature::new("t", "t@example.com"),
            ts_unix_ms: 0,
        };
        let head = base.seed_ref("master", &commit).unwrap();

        let overlay = Overlay::new(&base);
        let mut next = commit.clone();
        next.parent = Some(head);
        let next_hash = overlay.create_commit(&next).unwrap();
        overlay.update_ref("master", Some(head), next_hash).unwrap();

        assert_eq!(overlay.resolve_ref("master").unwrap(), Some(next_hash));
        assert_eq!(overlay.read_commit(next_hash).unwrap(), next);
        assert_eq!(overlay.pending_commits(), 1);
        assert_eq!(base.resolve_ref("master").unwrap(), Some(head));
        assert!(base.read_commit(next_hash).is_err());
    }
}
