//! List the entries of a snapshot

use crate::util;
use anyhow::Result;
use owo_colors::OwoColorize;
use snip_core::snapshot::walk;
use snip_core::{ObjectStore, Publisher, TreeEntry};

pub async fn run(rev: Option<String>, recursive: bool) -> Result<()> {
    let store = util::open_store()?;
    let rev = match rev {
        Some(rev) => rev,
        None => store.head_branch()?,
    };
    let commit = store.read_commit(util::resolve_rev(&store, &rev)?)?;

    if recursive {
        walk(&store, commit.tree, &mut |path, entry| {
            if !entry.kind.is_tree() {
                print_entry(entry, path);
            }
        })?;
    } else {
        for entry in store.read_tree(commit.tree)?.iter() {
            print_entry(entry, &entry.name);
        }
    }
    Ok(())
}

fn print_entry(entry: &TreeEntry, path: &str) {
    let kind = format!("{:<4}", entry.kind.label());
    if entry.kind.is_tree() {
        println!("{} {} {}/", kind.blue(), entry.hash, path.blue());
    } else {
        println!("{} {} {}", kind.dimmed(), entry.hash, path);
    }
}
