//! Helpers for driving the `snip` binary in integration tests

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Repository plus an isolated config location
pub struct TestRepo {
    pub repo: tempfile::TempDir,
    pub home: tempfile::TempDir,
}

impl TestRepo {
    /// Empty repository, already initialized
    pub fn init() -> Self {
        let repo = Self {
            repo: tempfile::tempdir().unwrap(),
            home: tempfile::tempdir().unwrap(),
        };
        repo.snip(&["init"]).assert_success();
        repo
    }

    pub fn path(&self) -> &Path {
        self.repo.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.home.path().join("snip/config.toml")
    }

    pub fn snip(&self, args: &[&str]) -> SnipCommand {
        let mut cmd = SnipCommand::new(self.path());
        cmd.args(args)
            .env("SNIP_CONFIG", &self.config_path().display().to_string())
            .env("HOME", &self.home.path().display().to_string());
        cmd
    }
}

/// Write `files` (path, content) below `root`
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let full = root.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }
}

pub struct SnipCommand {
    working_dir: PathBuf,
    args: Vec<String>,
    env: HashMap<String, String>,
}

impl SnipCommand {
    pub fn new(working_dir: impl AsRef<Path>) -> Self {
        Self {
            working_dir: working_dir.as_ref().to_path_buf(),
            args: Vec::new(),
            env: HashMap::new(),
        }
    }

    pub fn args(&mut self, args: &[&str]) -> &mut Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn env(&mut self, key: &str, value: &str) -> &mut Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn execute(&self) -> CommandResult {
        let output = Command::new(env!("CARGO_BIN_EXE_snip"))
            .args(&self.args)
            .current_dir(&self.working_dir)
            .env_remove("RUST_LOG")
            .envs(&self.env)
            .output()
            .expect("failed to run snip");

        CommandResult {
            args: self.args.clone(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        }
    }

    pub fn assert_success(&self) -> CommandResult {
        let result = self.execute();
        assert!(result.success(), "{}", result.describe());
        result
    }

    pub fn assert_failure(&self) -> CommandResult {
        let result = self.execute();
        assert!(!result.success(), "{}", result.describe());
        result
    }
}

pub struct CommandResult {
    pub args: Vec<String>,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout).unwrap_or_else(|e| panic!("{}: {}", e, self.describe()))
    }

    fn describe(&self) -> String {
        format!(
            "snip {:?} exited with {}\nstdout: {}\nstderr: {}",
            self.args, self.exit_code, self.stdout, self.stderr
        )
    }
}
