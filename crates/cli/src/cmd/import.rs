//! Snapshot a directory onto a branch

use crate::locks::RepoLock;
use crate::system_config::SystemConfig;
use crate::util;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use snip_core::commit::now_unix_ms;
use snip_core::snapshot::import_dir;
use snip_core::{Commit, Publisher};
use std::path::Path;

pub async fn run(
    config: &SystemConfig,
    dir: &Path,
    branch: Option<String>,
    message: Option<String>,
) -> Result<()> {
    // 1. Open repository and take the write lock
    let store = util::open_store()?;
    let _lock = RepoLock::acquire(store.snip_dir(), "import")?;
    let branch = util::pick_branch(branch, &config.prune.branch);

    let dir = dir
        .canonicalize()
        .with_context(|| format!("Cannot read directory {}", dir.display()))?;
    if !dir.is_dir() {
        anyhow::bail!("{} is not a directory", dir.display());
    }

    // 2. Build the tree hierarchy
    let stats = import_dir(&store, store.blob_store(), &dir)
        .with_context(|| format!("Failed to import {}", dir.display()))?;

    // 3. Skip identical snapshots
    let parent = store.resolve_ref(&branch)?;
    if let Some(head) = parent {
        if store.read_commit(head)?.tree == stats.tree {
            println!("{} {} already matches {}", "·".dimmed(), branch.cyan(), dir.display());
            return Ok(());
        }
    }

    // 4. Commit and move the branch
    let commit = Commit {
        parent,
        tree: stats.tree,
        message: message.unwrap_or_else(|| format!("Import {}", dir.display())),
        author: config.author(),
        ts_unix_ms: now_unix_ms(),
    };
    let hash = store.create_commit(&commit)?;
    store
        .update_ref(&branch, parent, hash)
        .with_context(|| format!("Failed to update branch {}", branch))?;

    println!(
        "{} Imported {} files ({} trees) into {} at {}",
        "✓".green(),
        stats.files,
        stats.trees,
        branch.cyan(),
        hash.short().yellow()
    );
    Ok(())
}
