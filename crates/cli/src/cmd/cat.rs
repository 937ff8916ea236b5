//! Print the content of a file in a snapshot

use crate::util;
use anyhow::{Context, Result};
use snip_core::snapshot::lookup_path;
use snip_core::Publisher;
use std::io::Write;

pub async fn run(spec: &str) -> Result<()> {
    let (rev, path) = util::split_rev_path(spec)?;
    let store = util::open_store()?;
    let commit = store.read_commit(util::resolve_rev(&store, rev)?)?;

    let entry = lookup_path(&store, commit.tree, path)?
        .with_context(|| format!("Path '{}' does not exist in '{}'", path, rev))?;
    if entry.kind.is_tree() {
        anyhow::bail!("'{}' is a directory", path);
    }

    let content = store
        .blob_store()
        .read_blob(entry.hash)
        .with_context(|| format!("Failed to read content of '{}'", path))?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&content)?;
    stdout.flush()?;
    Ok(())
}
