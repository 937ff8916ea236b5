//! Tree objects: one directory level of a snapshot

use crate::error::StoreError;
use crate::hash::{hash_bytes, Blake3Hash};
use std::cmp::Ordering;

/// Type of tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file
    File,
    /// Executable file
    Executable,
    /// Symbolic link
    Symlink,
    /// Nested tree (directory)
    Tree,
}

impl EntryKind {
    fn to_byte(self) -> u8 {
        match self {
            EntryKind::File => 0,
            EntryKind::Executable => 1,
            EntryKind::Symlink => 2,
            EntryKind::Tree => 3,
        }
    }

    fn from_byte(byte: u8) -> Result<Self, StoreError> {
        match byte {
            0 => Ok(EntryKind::File),
            1 => Ok(EntryKind::Executable),
            2 => Ok(EntryKind::Symlink),
            3 => Ok(EntryKind::Tree),
            other => Err(StoreError::Corrupt(format!("unknown entry kind {}", other))),
        }
    }

    /// Whether this entry points at another tree
    pub fn is_tree(self) -> bool {
        self == EntryKind::Tree
    }

    /// Short label used in listings
    pub fn label(self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Executable => "exec",
            EntryKind::Symlink => "link",
            EntryKind::Tree => "tree",
        }
    }
}

/// Named, hash-identified entry within a tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreeEntry {
    /// Entry name within its parent (a single path segment)
    pub name: String,
    pub kind: EntryKind,
    /// Blob hash for files and symlinks, tree hash for directories
    pub hash: Blake3Hash,
}

impl TreeEntry {
    pub fn new(name: impl Into<String>, kind: EntryKind, hash: Blake3Hash) -> Self {
        Self {
            name: name.into(),
            kind,
            hash,
        }
    }

    /// Create a regular file entry
    pub fn file(name: impl Into<String>, hash: Blake3Hash) -> Self {
        Self::new(name, EntryKind::File, hash)
    }

    /// Create a directory entry
    pub fn tree(name: impl Into<String>, hash: Blake3Hash) -> Self {
        Self::new(name, EntryKind::Tree, hash)
    }

    /// Same entry re-pointed at a different hash
    pub fn with_hash(&self, hash: Blake3Hash) -> Self {
        Self {
            name: self.name.clone(),
            kind: self.kind,
            hash,
        }
    }
}

/// Check that `name` is usable as a single path segment
pub fn validate_name(name: &str) -> Result<(), StoreError> {
    let reason = if name.is_empty() {
        "empty entry name"
    } else if name == "." || name == ".." {
        "reserved entry name"
    } else if name.contains('/') || name.contains('\0') {
        "entry name contains a separator or NUL"
    } else if name.len() > u16::MAX as usize {
        "entry name too long"
    } else {
        return Ok(());
    };
    Err(StoreError::InvalidPath {
        path: name.to_string(),
        reason,
    })
}

/// A tree is the list of entries of one directory, kept sorted by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    const MAGIC: [u8; 4] = *b"SNT1";

    /// Create a new empty tree
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build a tree from entries in any order
    pub fn from_entries(entries: impl IntoIterator<Item = TreeEntry>) -> Result<Self, StoreError> {
        let mut tree = Self::new();
        for entry in entries {
            tree.insert(entry)?;
        }
        Ok(tree)
    }

    fn position(&self, name: &str) -> Result<usize, usize> {
        self.entries.binary_search_by(|e| e.name.as_str().cmp(name))
    }

    /// Insert an entry, returning the entry it replaced
    pub fn insert(&mut self, entry: TreeEntry) -> Result<Option<TreeEntry>, StoreError> {
        validate_name(&entry.name)?;
        match self.position(&entry.name) {
            Ok(idx) => Ok(Some(std::mem::replace(&mut self.entries[idx], entry))),
            Err(idx) => {
                self.entries.insert(idx, entry);
                Ok(None)
            }
        }
    }

    /// Get an entry by name
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.position(name).ok().map(|idx| &self.entries[idx])
    }

    /// Remove an entry by name
    pub fn remove(&mut self, name: &str) -> Option<TreeEntry> {
        self.position(name).ok().map(|idx| self.entries.remove(idx))
    }

    /// Iterate entries in name order
    pub fn iter(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the tree to bytes (TreeV1 format)
    ///
    /// Format:
    /// - magic: "SNT1" (4 bytes)
    /// - entry_count: u32 LE
    /// - entries (sorted lexicographically by name):
    ///   - name_len: u16 LE
    ///   - name_bytes: [u8; name_len]
    ///   - kind: u8 (0=file, 1=executable, 2=symlink, 3=tree)
    ///   - hash: [u8; 32]
    pub fn serialize(&self) -> Vec<u8> {
        let body: usize = self.entries.iter().map(|e| 2 + e.name.len() + 1 + 32).sum();
        let mut out = Vec::with_capacity(8 + body);
        out.extend_from_slice(&Self::MAGIC);
        out.extend_from_slice(&(self.entries.len() as u32).to_le_bytes());
        for entry in &self.entries {
            out.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
            out.extend_from_slice(entry.name.as_bytes());
            out.push(entry.kind.to_byte());
            out.extend_from_slice(entry.hash.as_bytes());
        }
        out
    }

    /// Deserialize a tree from bytes (TreeV1 format)
    pub fn deserialize(bytes: &[u8]) -> Result<Self, StoreError> {
        let mut reader = Reader { bytes, pos: 0 };

        if reader.take(4)? != Self::MAGIC {
            return Err(StoreError::Corrupt("bad tree magic".to_string()));
        }
        let count = u32::from_le_bytes(reader.array::<4>()?) as usize;

        let mut entries: Vec<TreeEntry> = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            let name_len = u16::from_le_bytes(reader.array::<2>()?) as usize;
            let name = std::str::from_utf8(reader.take(name_len)?)
                .map_err(|_| StoreError::Corrupt("tree entry name is not UTF-8".to_string()))?
                .to_string();
            validate_name(&name).map_err(|e| StoreError::Corrupt(e.to_string()))?;
            let kind = EntryKind::from_byte(reader.array::<1>()?[0])?;
            let hash = Blake3Hash::from_bytes(reader.array::<32>()?);

            if let Some(prev) = entries.last() {
                if prev.name.as_str().cmp(&name) != Ordering::Less {
                    return Err(StoreError::Corrupt(format!(
                        "tree entries unsorted or duplicated at {:?}",
                        name
                    )));
                }
            }
            entries.push(TreeEntry { name, kind, hash });
        }

        if reader.pos != bytes.len() {
            return Err(StoreError::Corrupt("trailing bytes after tree".to_string()));
        }
        Ok(Self { entries })
    }

    /// Compute the hash of this tree
    ///
    /// Hash is deterministic - same tree content always produces same hash
    pub fn hash(&self) -> Blake3Hash {
        hash_bytes(&self.serialize())
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], StoreError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| StoreError::Corrupt("truncated tree".to_string()))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], StoreError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }
}
