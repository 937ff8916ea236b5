//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use snip_core::{Blake3Hash, Publisher, Store};

/// Minimum length of an abbreviated commit hash
pub const MIN_PREFIX_LEN: usize = 4;

/// Open the repository containing the current directory
pub fn open_store() -> Result<Store> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    Store::discover(&cwd).context("Not a snip repository (run `snip init` first)")
}

/// Resolve a revision to a commit hash
///
/// Supports:
/// - Branch name: "master"
/// - Full commit hash (64 hex chars)
/// - Abbreviated hash: at least 4 hex chars, must be unique
pub fn resolve_rev(store: &Store, rev: &str) -> Result<Blake3Hash> {
    if let Some(head) = branch_head(store, rev)? {
        return Ok(head);
    }

    if rev.len() == Blake3Hash::HEX_LEN {
        if let Ok(hash) = Blake3Hash::from_hex(rev) {
            store
                .read_commit(hash)
                .with_context(|| format!("Commit not found: {}", rev))?;
            return Ok(hash);
        }
    }

    if rev.len() >= MIN_PREFIX_LEN && rev.chars().all(|c| c.is_ascii_hexdigit()) {
        let matching = store.find_commits_by_prefix(rev)?;
        match matching.as_slice() {
            [hash] => return Ok(*hash),
            [] => {}
            many => anyhow::bail!(
                "Ambiguous commit prefix '{}': matches {} commits",
                rev,
                many.len()
            ),
        }
    }

    anyhow::bail!("Unknown revision: '{}'", rev)
}

/// Head of `branch`, or `None` if it is not a valid existing branch
fn branch_head(store: &Store, branch: &str) -> Result<Option<Blake3Hash>> {
    if snip_core::store::validate_ref_name(branch).is_err() {
        return Ok(None);
    }
    Ok(store.resolve_ref(branch)?)
}

/// Branch to operate on: the flag if given, else the configured default
pub fn pick_branch(flag: Option<String>, configured: &str) -> String {
    flag.unwrap_or_else(|| configured.to_string())
}

/// Split `<rev>:<path>`
pub fn split_rev_path(spec: &str) -> Result<(&str, &str)> {
    match spec.split_once(':') {
        Some((rev, path)) if !rev.is_empty() && !path.is_empty() => Ok((rev, path)),
        _ => anyhow::bail!("Expected <rev>:<path>, got '{}'", spec),
    }
}

/// Format timestamp as relative time ("2 hours ago")
pub fn format_relative_time(ts_ms: u64) -> String {
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    let datetime = UNIX_EPOCH + Duration::from_millis(ts_ms);

    if let Ok(elapsed) = SystemTime::now().duration_since(datetime) {
        let seconds = elapsed.as_secs();

        if seconds < 60 {
            format!("{} seconds ago", seconds)
        } else if seconds < 3600 {
            format!("{} minutes ago", seconds / 60)
        } else if seconds < 86400 {
            format!("{} hours ago", seconds / 3600)
        } else if seconds < 604800 {
            format!("{} days ago", seconds / 86400)
        } else {
            format!("{} weeks ago", seconds / 604800)
        }
    } else {
        "in the future".to_string()
    }
}

/// Format timestamp as absolute UTC time ("2024-01-03 14:30:00")
pub fn format_absolute_time(ts_ms: u64) -> String {
    i64::try_from(ts_ms)
        .ok()
        .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| format!("@{}ms", ts_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use snip_core::{Commit, ObjectStore, Signature, Tree};

    fn store_with_commit() -> (tempfile::TempDir, Store, Blake3Hash) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::init(dir.path()).unwrap();
        let tree = store.write_tree(&Tree::new()).unwrap();
        let head = store
            .create_commit(&Commit {
                parent: None,
                tree,
                message: "Import".to_string(),
                author: Signature::new("t", "t@example.com"),
                ts_unix_ms: 0,
            })
            .unwrap();
        store.update_ref("master", None, head).unwrap();
        (dir, store, head)
    }

    #[test]
    fn test_resolve_rev() {
        let (_dir, store, head) = store_with_commit();
        let hex = head.to_hex();

        assert_eq!(resolve_rev(&store, "master").unwrap(), head);
        assert_eq!(resolve_rev(&store, &hex).unwrap(), head);
        assert_eq!(resolve_rev(&store, &hex[..6]).unwrap(), head);
        assert_eq!(resolve_rev(&store, &hex[..6].to_uppercase()).unwrap(), head);
        assert!(resolve_rev(&store, &hex[..3]).is_err());
        assert!(resolve_rev(&store, "dev").is_err());
        assert!(resolve_rev(&store, "not a rev").is_err());
    }

    #[test]
    fn test_split_rev_path() {
        assert_eq!(split_rev_path("master:dir/a.py").unwrap(), ("master", "dir/a.py"));
        assert!(split_rev_path("master").is_err());
        assert!(split_rev_path(":a.py").is_err());
    }

    #[test]
    fn test_format_absolute_time() {
        assert_eq!(format_absolute_time(0), "1970-01-01 00:00:00");
        assert_eq!(format_absolute_time(1_704_292_200_000), "2024-01-03 14:30:00");
        assert_eq!(format_absolute_time(1_704_292_200_999), "2024-01-03 14:30:00");
        assert_eq!(format_absolute_time(u64::MAX), format!("@{}ms", u64::MAX));
    }
}
