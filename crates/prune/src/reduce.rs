//! Snapshot tree reducer
//!
//! Walks a snapshot hierarchy in lock-step with a [`PathTrie`]. Entries with
//! no matching trie child are copied by identity; terminal matches are
//! dropped; non-terminal matches on directories recurse. A level is only
//! written back to the store when something below it changed, so untouched
//! subtrees keep their original hashes and are never even read.

use crate::trie::{PathTrie, TrieNode};
use crate::Result;
use snip_core::{Blake3Hash, ObjectStore, Tree, TreeEntry};
use tracing::{debug, info, warn};

/// Outcome of reducing one tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduced {
    /// Nothing below this tree was removed; keep the original hash
    Unchanged,
    /// A rebuilt tree was written under this hash
    NewTree(Blake3Hash),
}

impl Reduced {
    /// Hash the parent entry should point at
    pub fn resolve(self, original: Blake3Hash) -> Blake3Hash {
        match self {
            Reduced::Unchanged => original,
            Reduced::NewTree(hash) => hash,
        }
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, Reduced::NewTree(_))
    }
}

/// Work done by a reduction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReduceStats {
    pub trees_read: usize,
    pub trees_written: usize,
    /// Full paths of omitted entries, in traversal order
    pub removed: Vec<String>,
}

/// Depth-first reducer bound to one store
pub struct Reducer<'s, S: ?Sized> {
    store: &'s S,
    stats: ReduceStats,
}

impl<'s, S: ObjectStore + ?Sized> Reducer<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            stats: ReduceStats::default(),
        }
    }

    /// Reduce the tree `tree` against the trie rooted at `node`
    pub fn reduce(&mut self, tree: Blake3Hash, node: &TrieNode) -> Result<Reduced> {
        if !node.has_children() {
            return Ok(Reduced::Unchanged);
        }
        self.reduce_at(tree, node, "")
    }

    pub fn stats(&self) -> &ReduceStats {
        &self.stats
    }

    pub fn into_stats(self) -> ReduceStats {
        self.stats
    }

    fn reduce_at(&mut self, tree: Blake3Hash, node: &TrieNode, prefix: &str) -> Result<Reduced> {
        let original = self.store.read_tree(tree)?;
        self.stats.trees_read += 1;

        let mut kept: Vec<TreeEntry> = Vec::with_capacity(original.len());
        let mut changed = false;

        for entry in original.iter() {
            let Some(child) = node.child(&entry.name) else {
                kept.push(entry.clone());
                continue;
            };
            let path = join(prefix, &entry.name);

            if child.is_terminal() {
                if entry.kind.is_tree() {
                    warn!("Removing directory {} with all of its contents", path);
                } else {
                    info!("Removing {}", path);
                }
                self.stats.removed.push(path);
                changed = true;
                continue;
            }

            if !entry.kind.is_tree() {
                // Targets below a file cannot exist
                debug!("{} is a {}, not descending", path, entry.kind.label());
                kept.push(entry.clone());
                continue;
            }

            debug!("Descending into {}", path);
            match self.reduce_at(entry.hash, child, &path)? {
                Reduced::Unchanged => kept.push(entry.clone()),
                Reduced::NewTree(hash) => {
                    kept.push(entry.with_hash(hash));
                    changed = true;
                }
            }
        }

        if !changed {
            return Ok(Reduced::Unchanged);
        }

        let rebuilt = Tree::from_entries(kept)?;
        let hash = self.store.write_tree(&rebuilt)?;
        self.stats.trees_written += 1;
        debug!(
            "Rebuilt {} ({} entries) as {}",
            if prefix.is_empty() { "/" } else { prefix },
            rebuilt.len(),
            hash.short()
        );
        Ok(Reduced::NewTree(hash))
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

/// Reduce `tree` by every target in `trie`
pub fn reduce<S: ObjectStore + ?Sized>(store: &S, tree: Blake3Hash, trie: &PathTrie) -> Result<Reduced> {
    Reducer::new(store).reduce(tree, trie.root())
}
