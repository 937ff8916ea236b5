//! Snapshot helpers: import a directory, walk and look up paths in a hierarchy

use crate::blob::BlobStore;
use crate::error::StoreError;
use crate::hash::Blake3Hash;
use crate::store::{normalize_path, ObjectStore, SNIP_DIR};
use crate::tree::{EntryKind, Tree, TreeEntry};
use crate::Result;
use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::path::Path;

/// Result of importing a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStats {
    /// Root tree of the imported hierarchy
    pub tree: Blake3Hash,
    pub files: usize,
    pub trees: usize,
}

#[derive(Default)]
struct DirNode {
    leaves: BTreeMap<String, TreeEntry>,
    dirs: BTreeMap<String, DirNode>,
}

impl DirNode {
    fn insert(&mut self, segments: &[&str], entry: TreeEntry) {
        match segments {
            [] => {}
            [_] => {
                self.leaves.insert(entry.name.clone(), entry);
            }
            [dir, rest @ ..] => self.dirs.entry(dir.to_string()).or_default().insert(rest, entry),
        }
    }

    fn write<S: ObjectStore + ?Sized>(self, store: &S, trees: &mut usize) -> Result<Blake3Hash> {
        let mut tree = Tree::new();
        for (name, dir) in self.dirs {
            let hash = dir.write(store, trees)?;
            tree.insert(TreeEntry::tree(name, hash))?;
        }
        for (_, leaf) in self.leaves {
            tree.insert(leaf)?;
        }
        *trees += 1;
        store.write_tree(&tree)
    }
}

/// Build a tree hierarchy from the files under `dir`
///
/// Honours `.gitignore` and always skips `.snip/` and `.git/`. Empty
/// directories are not recorded.
pub fn import_dir<S: ObjectStore + ?Sized>(
    store: &S,
    blobs: &BlobStore,
    dir: &Path,
) -> Result<ImportStats> {
    let walker = WalkBuilder::new(dir)
        .hidden(false)
        .require_git(false)
        .follow_links(false)
        .filter_entry(|e| {
            let name = e.file_name();
            name != SNIP_DIR && name != ".git"
        })
        .build();

    let mut root = DirNode::default();
    let mut files = 0usize;

    for item in walker {
        let item = item.map_err(|e| StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
        let Some(file_type) = item.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            continue;
        }

        let path = item.path();
        let rel = path
            .strip_prefix(dir)
            .map_err(|_| StoreError::InvalidPath {
                path: path.display().to_string(),
                reason: "outside import root",
            })?;
        let rel = rel
            .to_str()
            .ok_or_else(|| StoreError::InvalidPath {
                path: rel.display().to_string(),
                reason: "path is not UTF-8",
            })?
            .replace(std::path::MAIN_SEPARATOR, "/");
        let rel = normalize_path(&rel)?;

        let (kind, content) = if file_type.is_symlink() {
            let target = std::fs::read_link(path)?;
            (EntryKind::Symlink, target.to_string_lossy().into_owned().into_bytes())
        } else {
            let kind = if is_executable(path)? {
                EntryKind::Executable
            } else {
                EntryKind::File
            };
            (kind, std::fs::read(path)?)
        };

        let hash = blobs.write_blob(&content)?;
        let segments: Vec<&str> = rel.split('/').collect();
        let name = segments[segments.len() - 1];
        root.insert(&segments, TreeEntry::new(name, kind, hash));
        files += 1;
        tracing::debug!("Imported {}", rel);
    }

    let mut trees = 0usize;
    let tree = root.write(store, &mut trees)?;
    tracing::info!("Imported {} files into {} trees (root {})", files, trees, tree.short());
    Ok(ImportStats { tree, files, trees })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> Result<bool> {
    use std::os::unix::fs::PermissionsExt;
    Ok(std::fs::metadata(path)?.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> Result<bool> {
    Ok(false)
}

/// Visit every entry below `tree` depth-first in name order
///
/// The callback receives the full `/`-joined path of each entry, including
/// directory entries (visited before their contents).
pub fn walk<S, F>(store: &S, tree: Blake3Hash, visit: &mut F) -> Result<()>
where
    S: ObjectStore + ?Sized,
    F: FnMut(&str, &TreeEntry),
{
    walk_at(store, tree, "", visit)
}

fn walk_at<S, F>(store: &S, tree: Blake3Hash, prefix: &str, visit: &mut F) -> Result<()>
where
    S: ObjectStore + ?Sized,
    F: FnMut(&str, &TreeEntry),
{
    for entry in store.read_tree(tree)?.iter() {
        let path = if prefix.is_empty() {
            entry.name.clone()
        } else {
            format!("{}/{}", prefix, entry.name)
        };
        visit(&path, entry);
        if entry.kind.is_tree() {
            walk_at(store, entry.hash, &path, visit)?;
        }
    }
    Ok(())
}

/// Flatten a hierarchy into `(path, entry)` pairs for every non-directory entry
pub fn list_files<S: ObjectStore + ?Sized>(
    store: &S,
    tree: Blake3Hash,
) -> Result<Vec<(String, TreeEntry)>> {
    let mut out = Vec::new();
    walk(store, tree, &mut |path, entry| {
        if !entry.kind.is_tree() {
            out.push((path.to_string(), entry.clone()));
        }
    })?;
    Ok(out)
}

/// Resolve a single path below `tree`
///
/// Returns `None` when any segment is missing or a non-final segment is not
/// a directory.
pub fn lookup_path<S: ObjectStore + ?Sized>(
    store: &S,
    tree: Blake3Hash,
    path: &str,
) -> Result<Option<TreeEntry>> {
    let path = normalize_path(path)?;
    let mut current = tree;
    let mut segments = path.split('/').peekable();

    while let Some(segment) = segments.next() {
        let level = store.read_tree(current)?;
        let Some(entry) = level.get(segment) else {
            return Ok(None);
        };
        if segments.peek().is_none() {
            return Ok(Some(entry.clone()));
        }
        if !entry.kind.is_tree() {
            return Ok(None);
        }
        current = entry.hash;
    }
    Ok(None)
}
