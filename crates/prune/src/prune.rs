//! End-to-end pruning against a store
//!
//! 1. Validate the template, the target paths and their labels
//! 2. Resolve the branch head and read its commit
//! 3. Optionally check every target exists
//! 4. Reduce the snapshot and gate on the change detector
//! 5. Compose and create the commit, then move the branch

use crate::detect::{detect, Change};
use crate::error::PruneError;
use crate::message::{default_author, feature_label, CommitMessageOptions, CommitDraft};
use crate::reduce::{ReduceStats, Reducer};
use crate::trie::PathTrie;
use crate::Result;
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use snip_core::commit::now_unix_ms;
use snip_core::snapshot::lookup_path;
use snip_core::{Blake3Hash, Commit, ObjectStore, Overlay, Publisher, Signature};
use std::fmt;
use tracing::{debug, info};

/// What to do with targets that are not in the snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingTargets {
    /// Skip them silently
    #[default]
    Ignore,
    /// Fail before writing anything
    Strict,
}

impl fmt::Display for MissingTargets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingTargets::Ignore => write!(f, "ignore"),
            MissingTargets::Strict => write!(f, "strict"),
        }
    }
}

impl std::str::FromStr for MissingTargets {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ignore" => Ok(MissingTargets::Ignore),
            "strict" => Ok(MissingTargets::Strict),
            other => Err(format!("expected ignore or strict, got {:?}", other)),
        }
    }
}

/// Files to drop from the head of a branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneRequest {
    pub branch: String,
    /// Relative `/`-separated paths
    pub paths: Vec<String>,
}

impl PruneRequest {
    pub fn new<I, P>(branch: impl Into<String>, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            branch: branch.into(),
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PruneOptions {
    pub missing_targets: MissingTargets,
    pub message: CommitMessageOptions,
    /// Commit author. Defaults to the fixed pruning identity; callers may
    /// substitute their own, which `snip` exposes as the `[author]` config.
    pub author: Signature,
    /// Run against an in-memory overlay and leave the branch alone
    pub dry_run: bool,
}

impl Default for PruneOptions {
    fn default() -> Self {
        Self {
            missing_targets: MissingTargets::default(),
            message: CommitMessageOptions::default(),
            author: default_author(),
            dry_run: false,
        }
    }
}

/// A commit created by a pruning run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub commit: Blake3Hash,
    pub parent: Blake3Hash,
    pub tree: Blake3Hash,
    pub message: String,
    /// Targets actually removed, in request order
    pub removed: Vec<String>,
    pub stats: ReduceStats,
    /// The commit only exists in a discarded overlay
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PruneOutcome {
    /// None of the targets were present; nothing was written
    NoOp { head: Blake3Hash, stats: ReduceStats },
    Published(Published),
}

impl PruneOutcome {
    pub fn is_noop(&self) -> bool {
        matches!(self, PruneOutcome::NoOp { .. })
    }

    pub fn stats(&self) -> &ReduceStats {
        match self {
            PruneOutcome::NoOp { stats, .. } => stats,
            PruneOutcome::Published(published) => &published.stats,
        }
    }
}

/// Remove `request.paths` from the head of `request.branch`
///
/// Store failures propagate unchanged. The branch is moved with a
/// compare-and-swap on the head that was read, so a concurrent writer
/// surfaces as `RefConflict` instead of being overwritten.
pub fn prune<S>(store: &S, request: &PruneRequest, options: &PruneOptions) -> Result<PruneOutcome>
where
    S: ObjectStore + Publisher,
{
    // 1. Fail fast on bad input
    options.message.validate()?;
    let trie = PathTrie::build(&request.paths)?;
    for path in trie.paths() {
        feature_label(path)?;
    }

    // 2. Resolve head
    let head = store
        .resolve_ref(&request.branch)?
        .ok_or_else(|| PruneError::NoHead {
            branch: request.branch.clone(),
        })?;
    let parent = store.read_commit(head)?;
    info!(
        "Pruning {} target(s) from {} at {}",
        trie.paths().len(),
        request.branch,
        head.short()
    );

    // 3. Strict mode checks before any write
    if options.missing_targets == MissingTargets::Strict {
        let mut missing = Vec::new();
        for path in trie.paths() {
            if lookup_path(store, parent.tree, path)?.is_none() {
                missing.push(path.clone());
            }
        }
        if !missing.is_empty() {
            return Err(PruneError::TargetsNotFound(missing));
        }
    }

    // 4-5. Reduce and publish
    if options.dry_run {
        let overlay = Overlay::new(store);
        let outcome = publish(&overlay, request, options, &trie, head, &parent)?;
        debug!(
            "Dry run discarded {} tree(s) and {} commit(s)",
            overlay.pending_trees(),
            overlay.pending_commits()
        );
        Ok(outcome)
    } else {
        publish(store, request, options, &trie, head, &parent)
    }
}

fn publish<S>(
    store: &S,
    request: &PruneRequest,
    options: &PruneOptions,
    trie: &PathTrie,
    head: Blake3Hash,
    parent: &Commit,
) -> Result<PruneOutcome>
where
    S: ObjectStore + Publisher,
{
    let mut reducer = Reducer::new(store);
    let reduced = reducer.reduce(parent.tree, trie.root())?;
    let stats = reducer.into_stats();

    let tree = match detect(parent.tree, reduced) {
        Change::NoOp => {
            info!("Nothing to prune on {}", request.branch);
            return Ok(PruneOutcome::NoOp { head, stats });
        }
        Change::Changed { tree } => tree,
    };

    let hit: AHashSet<&str> = stats.removed.iter().map(String::as_str).collect();
    let removed: Vec<String> = trie
        .paths()
        .iter()
        .filter(|p| hit.contains(p.as_str()))
        .cloned()
        .collect();

    let draft = CommitDraft::compose(head, tree, &removed, &options.message, options.author.clone())?;
    let message = draft.message.clone();
    let commit = store.create_commit(&draft.into_commit(now_unix_ms()))?;

    if !options.dry_run {
        store.update_ref(&request.branch, Some(head), commit)?;
        info!("{} -> {}", request.branch, commit.short());
    }

    Ok(PruneOutcome::Published(Published {
        commit,
        parent: head,
        tree,
        message,
        removed,
        stats,
        dry_run: options.dry_run,
    }))
}
