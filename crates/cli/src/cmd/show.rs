//! Show a commit and the files it changed

use crate::util;
use anyhow::Result;
use owo_colors::OwoColorize;
use snip_core::snapshot::list_files;
use snip_core::{Blake3Hash, Publisher, Store};
use std::collections::BTreeMap;

pub async fn run(rev: &str) -> Result<()> {
    let store = util::open_store()?;
    let hash = util::resolve_rev(&store, rev)?;
    let commit = store.read_commit(hash)?;

    println!("{} {}", "commit".yellow(), hash.to_hex().yellow());
    if let Some(parent) = commit.parent {
        println!("{} {}", "parent".dimmed(), parent);
    }
    println!("{} {}", "tree  ".dimmed(), commit.tree);
    println!("{} {}", "author".dimmed(), commit.author);
    println!(
        "{} {} UTC ({})",
        "date  ".dimmed(),
        util::format_absolute_time(commit.ts_unix_ms),
        util::format_relative_time(commit.ts_unix_ms)
    );
    println!();
    for line in commit.message.lines() {
        println!("    {}", line);
    }
    println!();

    let after = files(&store, commit.tree)?;
    let before = match commit.parent {
        Some(parent) => files(&store, store.read_commit(parent)?.tree)?,
        None => BTreeMap::new(),
    };

    for (path, hash) in &before {
        match after.get(path) {
            None => println!("  {} {}", "-".red(), path.red()),
            Some(new) if new != hash => println!("  {} {}", "~".yellow(), path),
            Some(_) => {}
        }
    }
    for path in after.keys().filter(|p| !before.contains_key(*p)) {
        println!("  {} {}", "+".green(), path.green());
    }
    Ok(())
}

fn files(store: &Store, tree: Blake3Hash) -> Result<BTreeMap<String, Blake3Hash>> {
    Ok(list_files(store, tree)?
        .into_iter()
        .map(|(path, entry)| (path, entry.hash))
        .collect())
}
