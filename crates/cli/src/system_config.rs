//! User configuration
//!
//! Lives at `<config_dir>/snip/config.toml` unless `SNIP_CONFIG` points
//! elsewhere. Every field has a default, so a missing file behaves like an
//! empty one.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use snip_core::store::{validate_ref_name, DEFAULT_BRANCH};
use snip_core::Signature;
use snip_prune::{
    validate_template, CommitMessageOptions, MissingTargets, PruneOptions, DEFAULT_AUTHOR_EMAIL,
    DEFAULT_AUTHOR_NAME, DEFAULT_TEMPLATE,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Overrides the config file location
pub const CONFIG_ENV: &str = "SNIP_CONFIG";

pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub prune: PruneConfig,
    pub author: AuthorConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PruneConfig {
    /// Branch pruned when `-b` is not given
    pub branch: String,
    pub message_template: String,
    /// Appended to feature identifiers to get their file path
    pub feature_suffix: String,
    pub missing_targets: MissingTargets,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            branch: DEFAULT_BRANCH.to_string(),
            message_template: DEFAULT_TEMPLATE.to_string(),
            feature_suffix: ".py".to_string(),
            missing_targets: MissingTargets::Ignore,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorConfig {
    pub name: String,
    pub email: String,
}

impl Default for AuthorConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_AUTHOR_NAME.to_string(),
            email: DEFAULT_AUTHOR_EMAIL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl SystemConfig {
    pub fn validate(&self) -> Result<()> {
        validate_ref_name(&self.prune.branch)
            .with_context(|| format!("prune.branch: {:?} is not a valid branch name", self.prune.branch))?;
        validate_template(&self.prune.message_template).context("prune.message_template")?;

        let suffix = &self.prune.feature_suffix;
        if suffix.is_empty() || suffix.contains('/') {
            anyhow::bail!("prune.feature_suffix: must be non-empty and contain no '/', got {:?}", suffix);
        }
        if self.author.name.trim().is_empty() || self.author.email.trim().is_empty() {
            anyhow::bail!("author: name and email must be non-empty");
        }
        if !LOG_LEVELS.contains(&self.log.level.as_str()) {
            anyhow::bail!(
                "log.level: expected one of {}, got {:?}",
                LOG_LEVELS.join(", "),
                self.log.level
            );
        }
        Ok(())
    }

    pub fn author(&self) -> Signature {
        Signature::new(self.author.name.clone(), self.author.email.clone())
    }

    pub fn prune_options(&self) -> PruneOptions {
        PruneOptions {
            missing_targets: self.prune.missing_targets,
            message: CommitMessageOptions::with_template(self.prune.message_template.clone()),
            author: self.author(),
            dry_run: false,
        }
    }

    /// Map a feature identifier to its file path
    pub fn feature_path(&self, feature: &str) -> String {
        format!("{}{}", feature, self.prune.feature_suffix)
    }
}

/// Location of the config file
pub fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("snip").join("config.toml"))
}

/// Load the config, falling back to defaults when the file does not exist
pub fn load() -> Result<SystemConfig> {
    match config_file_path() {
        Some(path) => load_from(&path),
        None => {
            tracing::debug!("No config directory on this platform, using defaults");
            Ok(SystemConfig::default())
        }
    }
}

pub fn load_from(path: &Path) -> Result<SystemConfig> {
    if !path.exists() {
        return Ok(SystemConfig::default());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: SystemConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(config)
}

pub fn save(config: &SystemConfig) -> Result<()> {
    let path = config_file_path().context("Could not determine config file path")?;
    save_to(config, &path)
}

pub fn save_to(config: &SystemConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write the default config if no file exists yet
pub fn init_if_missing() -> Result<PathBuf> {
    let path = config_file_path().context("Could not determine config file path")?;
    if !path.exists() {
        fs::create_dir_all(path.parent().unwrap_or(Path::new(".")))?;
        fs::write(&path, example_config())
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(path)
}

pub fn example_config() -> String {
    format!(
        r#"# snip configuration

[prune]
# Branch pruned when -b is not given
branch = "{branch}"
# Must contain $features exactly once
message_template = "{template}"
# Appended to --feature identifiers
feature_suffix = ".py"
# "ignore" skips targets missing from the snapshot, "strict" fails on them
missing_targets = "ignore"

[author]
name = "{name}"
email = "{email}"

[log]
# trace, debug, info, warn, error or off (RUST_LOG takes precedence)
level = "warn"
"#,
        branch = DEFAULT_BRANCH,
        template = DEFAULT_TEMPLATE,
        name = DEFAULT_AUTHOR_NAME,
        email = DEFAULT_AUTHOR_EMAIL,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SystemConfig::default();
        config.validate().unwrap();
        assert_eq!(config.prune.branch, "master");
        assert_eq!(config.author().to_string(), "Ballet <dai-lab@mit.edu>");
        assert_eq!(config.feature_path("features/user_a/feature_x"), "features/user_a/feature_x.py");
    }

    #[test]
    fn test_example_parses_to_defaults() {
        let parsed: SystemConfig = toml::from_str(&example_config()).unwrap();
        assert_eq!(parsed, SystemConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let parsed: SystemConfig = toml::from_str("[prune]\nmissing_targets = \"strict\"\n").unwrap();
        assert_eq!(parsed.prune.missing_targets, MissingTargets::Strict);
        assert_eq!(parsed.prune.feature_suffix, ".py");
        assert_eq!(parsed.log.level, "warn");
    }

    #[test]
    fn test_validation_failures() {
        let mut config = SystemConfig::default();
        config.prune.message_template = "no placeholder".to_string();
        assert!(config.validate().is_err());

        let mut config = SystemConfig::default();
        config.prune.branch = "bad..name".to_string();
        assert!(config.validate().is_err());

        let mut config = SystemConfig::default();
        config.prune.feature_suffix = "a/b".to_string();
        assert!(config.validate().is_err());

        let mut config = SystemConfig::default();
        config.log.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_author_override_reaches_prune_options() {
        assert_eq!(
            SystemConfig::default().prune_options().author.to_string(),
            "Ballet <dai-lab@mit.edu>"
        );

        let parsed: SystemConfig =
            toml::from_str("[author]\nname = \"Pruner\"\nemail = \"pruner@example.com\"\n").unwrap();
        assert_eq!(
            parsed.prune_options().author.to_string(),
            "Pruner <pruner@example.com>"
        );
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        assert_eq!(load_from(&path).unwrap(), SystemConfig::default());

        let mut config = SystemConfig::default();
        config.prune.branch = "main".to_string();
        config.author.name = "Pruner".to_string();
        save_to(&config, &path).unwrap();
        assert_eq!(load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[log]\nlevel = \"loud\"\n").unwrap();
        assert!(load_from(&path).is_err());
    }
}
