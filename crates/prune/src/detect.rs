//! No-op detection at the snapshot root

use crate::reduce::Reduced;
use snip_core::Blake3Hash;

/// Whether a reduction warrants a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// None of the targets were present
    NoOp,
    /// The snapshot lost at least one entry; `tree` is the new root
    Changed { tree: Blake3Hash },
}

impl Change {
    pub fn is_noop(&self) -> bool {
        matches!(self, Change::NoOp)
    }
}

/// Gate a root-level reduction result
///
/// A rebuilt root that hashes back to the original is still a no-op.
pub fn detect(original: Blake3Hash, reduced: Reduced) -> Change {
    match reduced {
        Reduced::Unchanged => Change::NoOp,
        Reduced::NewTree(tree) if tree == original => Change::NoOp,
        Reduced::NewTree(tree) => Change::Changed { tree },
    }
}
