//! Initialize a snip repository

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use snip_core::{Store, StoreError};
use std::env;

pub async fn run() -> Result<()> {
    let current_dir = env::current_dir().context("Failed to get current directory")?;

    match Store::init(&current_dir) {
        Ok(store) => {
            let branch = store.head_branch()?;
            println!(
                "{} Initialized snip repository at {}",
                "✓".green(),
                store.snip_dir().display()
            );
            println!();
            println!("Created .snip/ directory structure:");
            println!("  - .snip/objects/blobs/     (file content storage)");
            println!("  - .snip/objects/trees/     (directory tree storage)");
            println!("  - .snip/objects/commits/   (commit storage)");
            println!("  - .snip/refs/heads/        (branch pointers)");
            println!();
            println!("Next steps:");
            println!("  - Run 'snip import <dir>' to snapshot files onto {}", branch.cyan());
            println!("  - Run 'snip prune <path>...' to remove files from the latest snapshot");
            Ok(())
        }
        Err(StoreError::AlreadyInitialized(root)) => {
            anyhow::bail!("snip repository already initialized at {}/.snip/", root.display())
        }
        Err(e) => Err(e).context("Failed to initialize repository"),
    }
}
