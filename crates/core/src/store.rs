//! Store traits and on-disk store management for trees, commits and refs

use crate::blob::BlobStore;
use crate::commit::Commit;
use crate::error::{ObjectKind, StoreError};
use crate::hash::Blake3Hash;
use crate::tree::Tree;
use crate::Result;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name of the repository metadata directory
pub const SNIP_DIR: &str = ".snip";

/// Branch a freshly initialized repository points HEAD at
pub const DEFAULT_BRANCH: &str = "master";

/// Read and create tree objects by content hash
pub trait ObjectStore {
    /// Fetch the entries of a tree
    fn read_tree(&self, hash: Blake3Hash) -> Result<Tree>;

    /// Persist a tree and return its identifier
    fn write_tree(&self, tree: &Tree) -> Result<Blake3Hash>;
}

/// Commit creation and branch pointer updates
pub trait Publisher {
    fn read_commit(&self, hash: Blake3Hash) -> Result<Commit>;

    fn create_commit(&self, commit: &Commit) -> Result<Blake3Hash>;

    /// Current commit of a branch, if the branch exists
    fn resolve_ref(&self, branch: &str) -> Result<Option<Blake3Hash>>;

    /// Move `branch` to `new` only if it still points at `expected`
    fn update_ref(
        &self,
        branch: &str,
        expected: Option<Blake3Hash>,
        new: Blake3Hash,
    ) -> Result<()>;
}

impl<T: ObjectStore + ?Sized> ObjectStore for &T {
    fn read_tree(&self, hash: Blake3Hash) -> Result<Tree> {
        (**self).read_tree(hash)
    }

    fn write_tree(&self, tree: &Tree) -> Result<Blake3Hash> {
        (**self).write_tree(tree)
    }
}

impl<T: Publisher + ?Sized> Publisher for &T {
    fn read_commit(&self, hash: Blake3Hash) -> Result<Commit> {
        (**self).read_commit(hash)
    }

    fn create_commit(&self, commit: &Commit) -> Result<Blake3Hash> {
        (**self).create_commit(commit)
    }

    fn resolve_ref(&self, branch: &str) -> Result<Option<Blake3Hash>> {
        (**self).resolve_ref(branch)
    }

    fn update_ref(
        &self,
        branch: &str,
        expected: Option<Blake3Hash>,
        new: Blake3Hash,
    ) -> Result<()> {
        (**self).update_ref(branch, expected, new)
    }
}

/// Main on-disk store
///
/// Manages the `.snip/` directory structure:
/// ```text
/// .snip/
///   HEAD
///   locks/
///     write.lock
///   objects/
///     blobs/<hh>/<rest>
///     trees/<hh>/<rest>
///     commits/<hh>/<rest>
///   refs/
///     heads/<branch>
///   tmp/
/// ```
pub struct Store {
    /// Root of repository
    root: PathBuf,
    /// Path to .snip directory
    snip_dir: PathBuf,
    blob_store: BlobStore,
    /// Tree cache (hash -> tree)
    tree_cache: DashMap<Blake3Hash, Arc<Tree>>,
    /// Serializes compare-and-swap ref updates within this process
    ref_lock: Mutex<()>,
}

impl Store {
    /// Initialize a new store at the given repository root
    pub fn init(repo_root: &Path) -> Result<Self> {
        let snip_dir = repo_root.join(SNIP_DIR);
        if snip_dir.exists() {
            return Err(StoreError::AlreadyInitialized(repo_root.to_path_buf()));
        }

        for sub in [
            "locks",
            "objects/blobs",
            "objects/trees",
            "objects/commits",
            "refs/heads",
            "tmp",
        ] {
            fs::create_dir_all(snip_dir.join(sub))?;
        }
        atomic_write(
            &snip_dir.join("tmp"),
            &snip_dir.join("HEAD"),
            format!("ref: refs/heads/{}\n", DEFAULT_BRANCH).as_bytes(),
        )?;

        tracing::info!("Initialized snip repository at {}", snip_dir.display());
        Self::open(repo_root)
    }

    /// Open an existing store
    pub fn open(repo_root: &Path) -> Result<Self> {
        let snip_dir = repo_root.join(SNIP_DIR);
        if !snip_dir.is_dir() {
            return Err(StoreError::NotInitialized(repo_root.to_path_buf()));
        }

        let blob_store = BlobStore::new(snip_dir.join("objects/blobs"), snip_dir.join("tmp"));
        Ok(Self {
            root: repo_root.to_path_buf(),
            snip_dir,
            blob_store,
            tree_cache: DashMap::new(),
            ref_lock: Mutex::new(()),
        })
    }

    /// Open the store of the repository containing `start`
    pub fn discover(start: &Path) -> Result<Self> {
        let mut current = Some(start);
        while let Some(dir) = current {
            if dir.join(SNIP_DIR).is_dir() {
                return Self::open(dir);
            }
            current = dir.parent();
        }
        Err(StoreError::NotInitialized(start.to_path_buf()))
    }

    /// Branch HEAD refers to
    pub fn head_branch(&self) -> Result<String> {
        let content = fs::read_to_string(self.snip_dir.join("HEAD"))?;
        let branch = content
            .trim()
            .strip_prefix("ref: refs/heads/")
            .ok_or_else(|| StoreError::Corrupt(format!("unrecognized HEAD: {:?}", content.trim())))?;
        validate_ref_name(branch)?;
        Ok(branch.to_string())
    }

    /// All branch names, sorted
    pub fn list_branches(&self) -> Result<Vec<String>> {
        let heads = self.snip_dir.join("refs/heads");
        let mut branches = Vec::new();
        collect_refs(&heads, &heads, &mut branches)?;
        branches.sort();
        Ok(branches)
    }

    /// Find commits whose hex form starts with `prefix`
    pub fn find_commits_by_prefix(&self, prefix: &str) -> Result<Vec<Blake3Hash>> {
        let prefix = prefix.to_ascii_lowercase();
        if prefix.len() < 2 || !prefix.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(Vec::new());
        }

        let fanout = self.snip_dir.join("objects/commits").join(&prefix[..2]);
        if !fanout.is_dir() {
            return Ok(Vec::new());
        }

        let mut matches = Vec::new();
        for entry in fs::read_dir(&fanout)? {
            let entry = entry?;
            let hex = format!("{}{}", &prefix[..2], entry.file_name().to_string_lossy());
            if hex.starts_with(&prefix) {
                if let Ok(hash) = Blake3Hash::from_hex(&hex) {
                    matches.push(hash);
                }
            }
        }
        matches.sort();
        Ok(matches)
    }

    /// Get the blob store
    pub fn blob_store(&self) -> &BlobStore {
        &self.blob_store
    }

    /// Get the .snip directory path
    pub fn snip_dir(&self) -> &Path {
        &self.snip_dir
    }

    /// Get the repository root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn tmp_dir(&self) -> PathBuf {
        self.snip_dir.join("tmp")
    }

    fn tree_path(&self, hash: Blake3Hash) -> PathBuf {
        object_path(&self.snip_dir.join("objects/trees"), hash)
    }

    fn commit_path(&self, hash: Blake3Hash) -> PathBuf {
        object_path(&self.snip_dir.join("objects/commits"), hash)
    }

    fn ref_path(&self, branch: &str) -> Result<PathBuf> {
        validate_ref_name(branch)?;
        Ok(self.snip_dir.join("refs/heads").join(branch))
    }

    fn read_object(&self, kind: ObjectKind, path: &Path, hash: Blake3Hash) -> Result<Vec<u8>> {
        match fs::read(path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::not_found(kind, hash))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl ObjectStore for Store {
    fn read_tree(&self, hash: Blake3Hash) -> Result<Tree> {
        if let Some(tree) = self.tree_cache.get(&hash) {
            return Ok(tree.as_ref().clone());
        }

        let bytes = self.read_object(ObjectKind::Tree, &self.tree_path(hash), hash)?;
        let tree = Tree::deserialize(&bytes)?;
        self.tree_cache.insert(hash, Arc::new(tree.clone()));
        Ok(tree)
    }

    fn write_tree(&self, tree: &Tree) -> Result<Blake3Hash> {
        let hash = tree.hash();
        let path = self.tree_path(hash);
        if !path.exists() {
            atomic_write(&self.tmp_dir(), &path, &tree.serialize())?;
        }
        self.tree_cache.insert(hash, Arc::new(tree.clone()));
        Ok(hash)
    }
}

impl Publisher for Store {
    fn read_commit(&self, hash: Blake3Hash) -> Result<Commit> {
        let bytes = self.read_object(ObjectKind::Commit, &self.commit_path(hash), hash)?;
        Commit::deserialize(&bytes)
    }

    fn create_commit(&self, commit: &Commit) -> Result<Blake3Hash> {
        let bytes = commit.serialize()?;
        let hash = crate::hash::hash_bytes(&bytes);
        let path = self.commit_path(hash);
        if !path.exists() {
            atomic_write(&self.tmp_dir(), &path, &bytes)?;
        }
        Ok(hash)
    }

    fn resolve_ref(&self, branch: &str) -> Result<Option<Blake3Hash>> {
        let path = self.ref_path(branch)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(Blake3Hash::from_hex(content.trim())?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn update_ref(
        &self,
        branch: &str,
        expected: Option<Blake3Hash>,
        new: Blake3Hash,
    ) -> Result<()> {
        let path = self.ref_path(branch)?;
        let _guard = self.ref_lock.lock();

        let actual = self.resolve_ref(branch)?;
        if actual != expected {
            return Err(ref_conflict(branch, expected, actual));
        }

        atomic_write(&self.tmp_dir(), &path, format!("{}\n", new).as_bytes())?;
        tracing::debug!("Updated refs/heads/{} -> {}", branch, new.short());
        Ok(())
    }
}

pub(crate) fn ref_conflict(
    branch: &str,
    expected: Option<Blake3Hash>,
    actual: Option<Blake3Hash>,
) -> StoreError {
    let show = |h: Option<Blake3Hash>| h.map(|h| h.to_hex()).unwrap_or_else(|| "<none>".to_string());
    StoreError::RefConflict {
        branch: branch.to_string(),
        expected: show(expected),
        actual: show(actual),
    }
}

fn collect_refs(base: &Path, dir: &Path, out: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_refs(base, &path, out)?;
        } else if let Ok(rel) = path.strip_prefix(base) {
            let name = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            out.push(name);
        }
    }
    Ok(())
}

/// Fan-out path for an object: `<root>/<hh>/<rest>`
pub(crate) fn object_path(root: &Path, hash: Blake3Hash) -> PathBuf {
    let hex = hash.to_hex();
    root.join(&hex[..2]).join(&hex[2..])
}

/// Atomic write helper
///
/// Writes data to a temporary file, fsyncs it, then renames it to the target path.
pub fn atomic_write(tmp_dir: &Path, target: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::create_dir_all(tmp_dir)?;

    let tmp_path = tmp_dir.join(format!("write-{}", uuid::Uuid::new_v4()));
    let result = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        fs::rename(&tmp_path, target)?;
        Ok(())
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    // Persist the rename itself
    #[cfg(unix)]
    {
        if let Some(dir) = target.parent().and_then(|p| fs::File::open(p).ok()) {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}

/// Normalize a path for use as a snapshot path
///
/// - Produces a relative path with `/` separators
/// - Removes `./` prefixes
/// - Rejects empty paths, absolute paths, `..` and empty segments
pub fn normalize_path(path: &str) -> Result<String> {
    let invalid = |reason| StoreError::InvalidPath {
        path: path.to_string(),
        reason,
    };

    if path.starts_with('/') {
        return Err(invalid("absolute paths are not allowed"));
    }

    let mut rest = path;
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }
    if rest.is_empty() {
        return Err(invalid("empty path"));
    }

    for segment in rest.split('/') {
        match segment {
            "" => return Err(invalid("empty path segment")),
            "." | ".." => return Err(invalid("relative segments are not allowed")),
            s if s.contains('\0') => return Err(invalid("NUL in path")),
            _ => {}
        }
    }
    Ok(rest.to_string())
}

/// Validate a branch name (git-like rules)
pub fn validate_ref_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name.starts_with('-')
        || name.ends_with(".lock")
        || name.contains("..")
        || name.chars().any(|c| {
            c.is_whitespace() || c.is_control() || matches!(c, ':' | '~' | '^' | '?' | '*' | '[' | '\\')
        })
        || name
            .split('/')
            .any(|seg| seg.is_empty() || seg.starts_with('.'));
    if bad {
        Err(StoreError::InvalidRef(name.to_string()))
    } else {
        Ok(())
    }
}
