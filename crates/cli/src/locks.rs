//! Repository write lock
//!
//! Commands that create objects or move refs hold an exclusive `flock` on
//! `.snip/locks/write.lock` for their whole run. The file records the
//! holder's PID so a lock left behind by a dead process can be reclaimed.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

pub struct RepoLock {
    path: PathBuf,
    #[allow(dead_code)]
    file: File,
}

#[derive(Serialize, Deserialize)]
struct LockContent {
    pid: u32,
    command: String,
    acquired_at: u64,
}

impl RepoLock {
    /// Acquire the write lock without blocking
    ///
    /// Fails if another live process holds it.
    pub fn acquire(snip_dir: &Path, command: &str) -> Result<Self> {
        Self::acquire_inner(snip_dir, command, true)
    }

    fn acquire_inner(snip_dir: &Path, command: &str, may_reclaim: bool) -> Result<Self> {
        let lock_path = snip_dir.join("locks/write.lock");
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create locks directory")?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&lock_path)
            .context("Failed to open lock file")?;

        if !try_flock_exclusive(&file)? {
            if may_reclaim && Self::is_stale_lock(&mut file)? {
                tracing::warn!("Removing stale write lock");
                drop(file);
                std::fs::remove_file(&lock_path)?;
                return Self::acquire_inner(snip_dir, command, false);
            }
            let holder = Self::read_lock_content(&mut file)
                .map(|c| format!(" by `snip {}` (pid {})", c.command, c.pid))
                .unwrap_or_default();
            anyhow::bail!("Repository is locked{}", holder);
        }

        Self::write_lock_content(&mut file, command)?;
        tracing::debug!("Acquired write lock for {}", command);

        Ok(Self {
            path: lock_path,
            file,
        })
    }

    fn is_stale_lock(file: &mut File) -> Result<bool> {
        match Self::read_lock_content(file) {
            Ok(content) => Ok(!is_process_alive(content.pid)),
            // Unreadable content means the holder died mid-write
            Err(_) => Ok(true),
        }
    }

    fn write_lock_content(file: &mut File, command: &str) -> Result<()> {
        let content = LockContent {
            pid: std::process::id(),
            command: command.to_string(),
            acquired_at: snip_core::commit::now_unix_ms(),
        };
        let serialized = serde_json::to_string(&content).context("Failed to serialize lock content")?;

        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(serialized.as_bytes())?;
        file.sync_all()?;
        Ok(())
    }

    fn read_lock_content(file: &mut File) -> Result<LockContent> {
        file.seek(SeekFrom::Start(0))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        serde_json::from_str(&contents).context("Failed to deserialize lock content")
    }
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(unix)]
fn try_flock_exclusive(file: &File) -> Result<bool> {
    use nix::fcntl::{flock, FlockArg};
    use std::os::unix::io::AsRawFd;

    match flock(file.as_raw_fd(), FlockArg::LockExclusiveNonblock) {
        Ok(_) => Ok(true),
        Err(nix::errno::Errno::EWOULDBLOCK) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(not(unix))]
fn try_flock_exclusive(_file: &File) -> Result<bool> {
    Ok(true)
}

#[cfg(target_os = "linux")]
fn is_process_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{}", pid)).exists()
}

#[cfg(all(unix, not(target_os = "linux")))]
fn is_process_alive(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    // Null signal probes for existence
    match kill(Pid::from_raw(pid as i32), None) {
        Ok(_) => true,
        Err(nix::errno::Errno::ESRCH) => false,
        Err(_) => true,
    }
}

#[cfg(not(unix))]
fn is_process_alive(_pid: u32) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_is_exclusive() {
        let temp_dir = TempDir::new().unwrap();

        let first = RepoLock::acquire(temp_dir.path(), "prune").unwrap();
        let err = RepoLock::acquire(temp_dir.path(), "import").err().unwrap();
        assert!(err.to_string().contains("snip prune"), "{}", err);

        drop(first);
        assert!(RepoLock::acquire(temp_dir.path(), "import").is_ok());
    }

    #[test]
    fn test_lock_file_removed_on_drop() {
        let temp_dir = TempDir::new().unwrap();
        let lock = RepoLock::acquire(temp_dir.path(), "prune").unwrap();
        let path = lock.path.clone();
        assert!(path.exists());

        drop(lock);
        assert!(!path.exists());
    }

    #[test]
    fn test_lock_content() {
        let temp_dir = TempDir::new().unwrap();
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(temp_dir.path().join("test.lock"))
            .unwrap();

        RepoLock::write_lock_content(&mut file, "import").unwrap();
        let content = RepoLock::read_lock_content(&mut file).unwrap();

        assert_eq!(content.pid, std::process::id());
        assert_eq!(content.command, "import");
        assert!(content.acquired_at > 0);
    }

    #[test]
    fn test_process_alive() {
        assert!(is_process_alive(std::process::id()));
        assert!(!is_process_alive(999_999_999));
    }
}
