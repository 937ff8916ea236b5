//! Tracing setup
//!
//! `RUST_LOG` wins when set. Otherwise the configured level applies, raised
//! by each `-v` on the command line.

use crate::system_config::LogConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Effective level for the configured level and `-v` count
pub fn effective_level(config: &LogConfig, verbose: u8) -> &str {
    match verbose {
        0 => config.level.as_str(),
        1 if matches!(config.level.as_str(), "off" | "error" | "warn") => "info",
        1 => config.level.as_str(),
        _ if config.level == "trace" => "trace",
        _ => "debug",
    }
}

pub fn init(config: &LogConfig, verbose: u8) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(spec) if !spec.is_empty() => EnvFilter::new(spec),
        _ => EnvFilter::new(effective_level(config, verbose)),
    };

    // Logs go to stderr so --json output stays parseable
    let _ = Registry::default()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(level: &str) -> LogConfig {
        LogConfig {
            level: level.to_string(),
        }
    }

    #[test]
    fn test_effective_level() {
        assert_eq!(effective_level(&level("warn"), 0), "warn");
        assert_eq!(effective_level(&level("warn"), 1), "info");
        assert_eq!(effective_level(&level("warn"), 2), "debug");
        assert_eq!(effective_level(&level("debug"), 1), "debug");
        assert_eq!(effective_level(&level("trace"), 3), "trace");
        assert_eq!(effective_level(&level("off"), 1), "info");
    }
}
