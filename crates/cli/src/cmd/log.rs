//! Show commit history

use crate::util;
use anyhow::Result;
use owo_colors::OwoColorize;
use snip_core::Publisher;

const DEFAULT_LIMIT: usize = 20;

pub async fn run(limit: Option<usize>, branch: Option<String>) -> Result<()> {
    let store = util::open_store()?;
    let branch = match branch {
        Some(branch) => branch,
        None => store.head_branch()?,
    };

    let Some(mut next) = store.resolve_ref(&branch)? else {
        println!("{}", format!("Branch {} has no commits yet", branch).dimmed());
        return Ok(());
    };

    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    for _ in 0..limit {
        let commit = store.read_commit(next)?;
        println!(
            "{} {} {}",
            next.short().yellow(),
            commit.summary(),
            format!(
                "({}, {})",
                commit.author.name,
                util::format_relative_time(commit.ts_unix_ms)
            )
            .dimmed()
        );
        match commit.parent {
            Some(parent) => next = parent,
            None => break,
        }
    }
    Ok(())
}
