//! Path trie built from the removal list
//!
//! `features/contrib/user_kelvin/feature_adder.py` becomes the chain
//! `features -> contrib -> user_kelvin -> feature_adder.py`, with the last
//! node marked terminal. Paths sharing a directory prefix share its nodes.

use crate::error::PruneError;
use ahash::AHashMap;
use smallvec::SmallVec;
use snip_core::{normalize_path, StoreError};

/// One path segment of the removal trie
#[derive(Debug, Clone, Default)]
pub struct TrieNode {
    segment: String,
    children: AHashMap<String, TrieNode>,
    terminal: bool,
}

impl TrieNode {
    fn new(segment: &str) -> Self {
        Self {
            segment: segment.to_string(),
            ..Self::default()
        }
    }

    /// Path component this node stands for (empty for the root)
    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn child(&self, segment: &str) -> Option<&TrieNode> {
        self.children.get(segment)
    }

    /// Children in no particular order
    pub fn children(&self) -> impl Iterator<Item = &TrieNode> {
        self.children.values()
    }

    /// True iff the path ending at this node is itself a removal target
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Removal trie plus the normalized target list it was built from
#[derive(Debug, Clone, Default)]
pub struct PathTrie {
    root: TrieNode,
    /// Normalized targets, deduplicated, in request order
    paths: Vec<String>,
}

impl PathTrie {
    /// Build the trie from POSIX-style relative paths
    ///
    /// Duplicates are merged. An empty list gives a root without children.
    pub fn build<I, P>(paths: I) -> Result<Self, PruneError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let mut trie = Self::default();
        for path in paths {
            trie.insert(path.as_ref())?;
        }
        Ok(trie)
    }

    fn insert(&mut self, raw: &str) -> Result<(), PruneError> {
        let path = normalize_path(raw).map_err(|e| match e {
            StoreError::InvalidPath { reason, .. } => PruneError::malformed(raw, reason),
            other => PruneError::Store(other),
        })?;

        let newly_terminal = {
            let segments: SmallVec<[&str; 8]> = path.split('/').collect();
            let mut node = &mut self.root;
            for segment in &segments {
                node = node
                    .children
                    .entry(segment.to_string())
                    .or_insert_with(|| TrieNode::new(segment));
            }
            !std::mem::replace(&mut node.terminal, true)
        };

        if newly_terminal {
            self.paths.push(path);
        }
        Ok(())
    }

    pub fn root(&self) -> &TrieNode {
        &self.root
    }

    /// Normalized removal targets in request order
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Whether `path` (already normalized) is a removal target
    pub fn contains(&self, path: &str) -> bool {
        let mut node = &self.root;
        for segment in path.split('/') {
            match node.child(segment) {
                Some(next) => node = next,
                None => return false,
            }
        }
        node.terminal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_prefixes_share_nodes() {
        let trie = PathTrie::build(["features/user_a/feature_x.py", "features/user_a/feature_y.py"])
            .unwrap();

        let root = trie.root();
        assert_eq!(root.segment(), "");
        assert_eq!(root.children().count(), 1);

        let user = root.child("features").unwrap().child("user_a").unwrap();
        assert!(!user.is_terminal());
        assert_eq!(user.children().count(), 2);
        assert!(user.child("feature_x.py").unwrap().is_terminal());
        assert!(!user.child("feature_x.py").unwrap().has_children());
    }

    #[test]
    fn test_empty_list_gives_bare_root() {
        let trie = PathTrie::build(Vec::<String>::new()).unwrap();
        assert!(trie.is_empty());
        assert!(!trie.root().has_children());
        assert!(!trie.root().is_terminal());
    }

    #[test]
    fn test_duplicates_are_idempotent() {
        let trie = PathTrie::build(["dir/b.py", "./dir/b.py", "dir/b.py"]).unwrap();
        assert_eq!(trie.paths(), ["dir/b.py"]);
        assert_eq!(trie.root().child("dir").unwrap().children().count(), 1);
    }

    #[test]
    fn test_prefix_is_not_terminal_unless_listed() {
        let trie = PathTrie::build(["dir/sub/x.py"]).unwrap();
        assert!(!trie.contains("dir"));
        assert!(!trie.contains("dir/sub"));
        assert!(trie.contains("dir/sub/x.py"));
        assert!(!trie.contains("dir/sub/x.py/deeper"));
    }

    #[test]
    fn test_literal_prefix_terminal_in_either_order() {
        for order in [["dir", "dir/x.py"], ["dir/x.py", "dir"]] {
            let trie = PathTrie::build(order).unwrap();
            let dir = trie.root().child("dir").unwrap();
            assert!(dir.is_terminal(), "{:?}", order);
            assert!(dir.child("x.py").unwrap().is_terminal());
            assert_eq!(trie.paths(), order);
        }
    }

    #[test]
    fn test_deep_paths_recorded_in_request_order() {
        let deep = "a/b/c/d/e/f/g/h/i/j/user_k/feature_deep.py";
        let trie = PathTrie::build([deep, "x/user_y/feature_z.py", deep]).unwrap();
        assert_eq!(trie.paths(), [deep, "x/user_y/feature_z.py"]);
        assert!(trie.contains(deep));
        assert!(!trie.contains("a/b/c/d/e/f/g/h/i/j"));
    }

    #[test]
    fn test_malformed_paths_rejected() {
        for bad in ["", "/abs/x.py", "a//b.py", "../x.py", "dir/"] {
            let err = PathTrie::build([bad]).unwrap_err();
            assert!(matches!(err, PruneError::MalformedPath { .. }), "{:?}", bad);
        }
    }
}
