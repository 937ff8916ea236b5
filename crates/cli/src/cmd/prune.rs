//! Remove files from the head of a branch

use crate::locks::RepoLock;
use crate::system_config::SystemConfig;
use crate::util;
use anyhow::{Context, Result};
use clap::Args;
use owo_colors::OwoColorize;
use snip_prune::{prune, MissingTargets, PruneOutcome, PruneRequest, Published};

#[derive(Debug, Args)]
pub struct PruneArgs {
    /// Relative paths of files to remove
    pub paths: Vec<String>,

    /// Feature identifier, mapped to a path with prune.feature_suffix
    #[arg(long = "feature", value_name = "ID")]
    pub features: Vec<String>,

    /// Branch to prune (default: prune.branch from config)
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Fail if any target is missing from the snapshot
    #[arg(long)]
    pub strict: bool,

    /// Compute the commit without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

impl PruneArgs {
    /// Explicit paths followed by mapped feature identifiers
    fn targets(&self, config: &SystemConfig) -> Vec<String> {
        self.paths
            .iter()
            .cloned()
            .chain(self.features.iter().map(|f| config.feature_path(f)))
            .collect()
    }
}

pub async fn run(config: &SystemConfig, args: PruneArgs) -> Result<()> {
    let targets = args.targets(config);
    if targets.is_empty() {
        anyhow::bail!("Nothing to remove: give at least one PATH or --feature");
    }

    // 1. Open repository; dry runs never write so they skip the lock
    let store = util::open_store()?;
    let _lock = if args.dry_run {
        None
    } else {
        Some(RepoLock::acquire(store.snip_dir(), "prune")?)
    };

    // 2. Configure
    let branch = util::pick_branch(args.branch.clone(), &config.prune.branch);
    let mut options = config.prune_options();
    if args.strict {
        options.missing_targets = MissingTargets::Strict;
    }
    options.dry_run = args.dry_run;

    // 3. Prune
    let request = PruneRequest::new(branch.clone(), targets);
    let outcome = prune(&store, &request, &options)
        .with_context(|| format!("Failed to prune {}", branch))?;

    // 4. Report
    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome_json(&branch, &outcome))?);
        return Ok(());
    }

    match &outcome {
        PruneOutcome::NoOp { head, .. } => {
            println!(
                "{} nothing to prune on {} ({})",
                "·".dimmed(),
                branch.cyan(),
                head.short().dimmed()
            );
        }
        PruneOutcome::Published(published) => print_published(&branch, published),
    }
    Ok(())
}

fn print_published(branch: &str, published: &Published) {
    for path in &published.removed {
        println!("  {} {}", "-".red(), path);
    }
    println!();

    if published.dry_run {
        println!(
            "{} Would commit {} on {} (dry run, nothing written)",
            "○".yellow(),
            published.commit.short().yellow(),
            branch.cyan()
        );
    } else {
        println!(
            "{} Committed {} on {}",
            "✓".green(),
            published.commit.short().yellow(),
            branch.cyan()
        );
    }
    println!("  {}", published.message);
    println!(
        "  {}",
        format!(
            "{} tree(s) read, {} rewritten",
            published.stats.trees_read, published.stats.trees_written
        )
        .dimmed()
    );
}

fn outcome_json(branch: &str, outcome: &PruneOutcome) -> serde_json::Value {
    match outcome {
        PruneOutcome::NoOp { head, stats } => serde_json::json!({
            "status": "noop",
            "branch": branch,
            "head": head.to_hex(),
            "trees_read": stats.trees_read,
        }),
        PruneOutcome::Published(p) => {
            let status = if p.dry_run { "dry_run" } else { "published" };
            serde_json::json!({
                "status": status,
                "branch": branch,
                "commit": p.commit.to_hex(),
                "parent": p.parent.to_hex(),
                "tree": p.tree.to_hex(),
                "message": p.message,
                "removed": p.removed,
                "trees_read": p.stats.trees_read,
                "trees_written": p.stats.trees_written,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: PruneArgs,
    }

    #[test]
    fn test_features_mapped_after_paths() {
        let harness = Harness::parse_from([
            "prune",
            "dir/a.py",
            "--feature",
            "features/user_a/feature_x",
            "--strict",
        ]);
        let targets = harness.args.targets(&SystemConfig::default());
        assert_eq!(targets, vec!["dir/a.py", "features/user_a/feature_x.py"]);
        assert!(harness.args.strict);
        assert!(!harness.args.dry_run);
    }
}
