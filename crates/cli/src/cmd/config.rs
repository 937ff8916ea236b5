//! Configuration management command
//!
//! Provides CLI interface to view and edit the user configuration.

use crate::system_config::{self, SystemConfig, LOG_LEVELS};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;

/// Every settable key, in display order
pub const KEYS: &[&str] = &[
    "prune.branch",
    "prune.message_template",
    "prune.feature_suffix",
    "prune.missing_targets",
    "author.name",
    "author.email",
    "log.level",
];

/// List all configuration values
pub async fn run_list(config: &SystemConfig) -> Result<()> {
    let config_path = system_config::config_file_path()
        .context("Could not determine config file path")?;

    println!("{}", "Configuration".bold());
    println!(
        "{}: {} {}\n",
        "Location".dimmed(),
        config_path.display().dimmed(),
        (if config_path.exists() { "" } else { "(not created, showing defaults)" }).dimmed()
    );

    let mut section = "";
    for &key in KEYS {
        let (head, name) = key.split_once('.').unwrap_or(("", key));
        if head != section {
            if !section.is_empty() {
                println!();
            }
            println!("{}", format!("[{}]", head).yellow());
            section = head;
        }
        println!("  {} = {:?}", name.cyan(), get_value(config, key)?);
    }

    println!("\n{}", "Valid Values:".bold());
    println!("  message_template: must contain $features exactly once");
    println!("  missing_targets: ignore, strict");
    println!("  level: {}", LOG_LEVELS.join(", "));

    Ok(())
}

/// Get a single configuration value
pub async fn run_get(config: &SystemConfig, key: &str) -> Result<()> {
    println!("{}", get_value(config, key)?);
    Ok(())
}

/// Set a configuration value
pub async fn run_set(mut config: SystemConfig, key: &str, value: &str) -> Result<()> {
    set_value(&mut config, key, value)?;

    // Validate before saving
    config.validate().context("Invalid configuration value")?;
    system_config::save(&config)?;

    println!("{} {} = {:?}", "✓".green(), key.cyan(), value);
    Ok(())
}

/// Show the config file path and optionally create it
pub async fn run_path(create: bool) -> Result<()> {
    let config_path = system_config::config_file_path()
        .context("Could not determine config file path")?;

    if create && !config_path.exists() {
        system_config::init_if_missing()?;
        println!("{} Created config file at: {}", "✓".green(), config_path.display());
    } else {
        println!("{}", config_path.display());
        if !config_path.exists() {
            println!("{}", "File does not exist. Use --create to create it.".yellow());
        }
    }

    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    print!("{}", system_config::example_config());
    Ok(())
}

fn get_value(config: &SystemConfig, key: &str) -> Result<String> {
    let value = match key {
        "prune.branch" => config.prune.branch.clone(),
        "prune.message_template" => config.prune.message_template.clone(),
        "prune.feature_suffix" => config.prune.feature_suffix.clone(),
        "prune.missing_targets" => config.prune.missing_targets.to_string(),
        "author.name" => config.author.name.clone(),
        "author.email" => config.author.email.clone(),
        "log.level" => config.log.level.clone(),
        _ => anyhow::bail!(
            "Unknown config key: {}. Use 'snip config list' to see available keys.",
            key
        ),
    };
    Ok(value)
}

fn set_value(config: &mut SystemConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "prune.branch" => config.prune.branch = value.to_string(),
        "prune.message_template" => config.prune.message_template = value.to_string(),
        "prune.feature_suffix" => config.prune.feature_suffix = value.to_string(),
        "prune.missing_targets" => {
            config.prune.missing_targets = value
                .parse()
                .map_err(|e: String| anyhow::anyhow!("Invalid value: {}", e))?;
        }
        "author.name" => config.author.name = value.to_string(),
        "author.email" => config.author.email = value.to_string(),
        "log.level" => config.log.level = value.to_ascii_lowercase(),
        _ => anyhow::bail!(
            "Unknown config key: {}. Use 'snip config list' to see available keys.",
            key
        ),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use snip_prune::MissingTargets;

    #[test]
    fn test_every_key_roundtrips() {
        let mut config = SystemConfig::default();
        for key in KEYS {
            let value = get_value(&config, key).unwrap();
            set_value(&mut config, key, &value).unwrap();
        }
        assert_eq!(config, SystemConfig::default());
    }

    #[test]
    fn test_set_value() {
        let mut config = SystemConfig::default();
        set_value(&mut config, "prune.missing_targets", "strict").unwrap();
        set_value(&mut config, "log.level", "DEBUG").unwrap();
        assert_eq!(config.prune.missing_targets, MissingTargets::Strict);
        assert_eq!(config.log.level, "debug");

        assert!(set_value(&mut config, "prune.missing_targets", "sometimes").is_err());
        assert!(set_value(&mut config, "daemon.interval", "1").is_err());
        assert!(get_value(&config, "nope").is_err());
    }
}
