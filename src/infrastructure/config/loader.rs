use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;
use crate::services::prediction_engine::OFFSET_RANGE;

/// Primary config file, relative to the working directory.
pub const CONFIG_FILE: &str = "relay.yaml";
/// Optional local overrides, relative to the working directory.
pub const LOCAL_CONFIG_FILE: &str = "relay.local.yaml";
/// Prefix for environment overrides; `__` separates nested keys.
pub const ENV_PREFIX: &str = "RELAY_";

/// Highest lookahead that still has a keycap status glyph.
const MAX_LOOKAHEAD: u8 = 9;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid offset: {0}. Must be between 1 and 50")]
    InvalidOffset(u64),

    #[error("Invalid max_concurrent: {0}. Must be at least 1")]
    InvalidMaxConcurrent(usize),

    #[error("Invalid max_lookahead: {0}. Must be between 0 and 9")]
    InvalidMaxLookahead(u8),

    #[error("Invalid {name}: {value}. Must be at least 1")]
    InvalidCapacity { name: &'static str, value: usize },

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    #[error(
        "Invalid request timeout: request_timeout_secs ({0}) must be greater than poll_timeout_secs ({1})"
    )]
    InvalidRequestTimeout(u64, u64),

    #[error("Telegram bot token is not set (RELAY_TELEGRAM__BOT_TOKEN)")]
    MissingBotToken,

    #[error("Telegram {0} is not set")]
    MissingChannel(&'static str),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. relay.yaml
    /// 3. relay.local.yaml (optional overrides)
    /// 4. Environment variables (RELAY_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(CONFIG_FILE))
            .merge(Yaml::file(LOCAL_CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honoring environment overrides
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise from the default locations
    pub fn load_optional(path: Option<&std::path::Path>) -> Result<Config> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::load(),
        }
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let engine = &config.engine;
        if !OFFSET_RANGE.contains(&engine.offset) {
            return Err(ConfigError::InvalidOffset(engine.offset));
        }
        if engine.max_concurrent == 0 {
            return Err(ConfigError::InvalidMaxConcurrent(engine.max_concurrent));
        }
        if engine.max_lookahead > MAX_LOOKAHEAD {
            return Err(ConfigError::InvalidMaxLookahead(engine.max_lookahead));
        }

        let relay = &config.relay;
        for (name, value) in [
            ("dedup_capacity", relay.dedup_capacity),
            ("finalized_capacity", relay.finalized_capacity),
            ("recent_games_capacity", relay.recent_games_capacity),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidCapacity { name, value });
            }
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(
                config.logging.rotation.clone(),
            ));
        }

        let telegram = &config.telegram;
        if telegram.request_timeout_secs <= telegram.poll_timeout_secs {
            return Err(ConfigError::InvalidRequestTimeout(
                telegram.request_timeout_secs,
                telegram.poll_timeout_secs,
            ));
        }

        Ok(())
    }

    /// Extra checks for running against Telegram
    pub fn validate_for_telegram(config: &Config) -> Result<(), ConfigError> {
        if config.telegram.bot_token.trim().is_empty() {
            return Err(ConfigError::MissingBotToken);
        }
        if config.telegram.source_channel_id == 0 {
            return Err(ConfigError::MissingChannel("source_channel_id"));
        }
        if config.telegram.prediction_channel_id == 0 {
            return Err(ConfigError::MissingChannel("prediction_channel_id"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ContinuationPolicy;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.engine.offset, 2);
        assert_eq!(config.relay.finalized_capacity, 100);
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
engine:
  offset: 3
  max_concurrent: 2
  continuation_policy: auto_chain
telegram:
  source_channel_id: -1001
  prediction_channel_id: -1002
logging:
  level: debug
  format: json
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.engine.offset, 3);
        assert_eq!(config.engine.max_concurrent, 2);
        assert_eq!(config.engine.continuation_policy, ContinuationPolicy::AutoChain);
        assert_eq!(config.telegram.source_channel_id, -1001);
        assert_eq!(config.logging.format, "json");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_offset_range() {
        let mut config = Config::default();
        config.engine.offset = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidOffset(0))
        ));

        config.engine.offset = 51;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidOffset(51))
        ));
    }

    #[test]
    fn test_validate_zero_max_concurrent() {
        let mut config = Config::default();
        config.engine.max_concurrent = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxConcurrent(0))
        ));
    }

    #[test]
    fn test_validate_lookahead_bound() {
        let mut config = Config::default();
        config.engine.max_lookahead = 9;
        assert!(ConfigLoader::validate(&config).is_ok());
        config.engine.max_lookahead = 10;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxLookahead(10))
        ));
    }

    #[test]
    fn test_validate_zero_capacity() {
        let mut config = Config::default();
        config.relay.finalized_capacity = 0;
        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidCapacity { name, value }) => {
                assert_eq!(name, "finalized_capacity");
                assert_eq!(value, 0);
            }
            other => panic!("Expected InvalidCapacity, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_settings() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogLevel(level)) if level == "invalid"
        ));

        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogFormat(_))
        ));

        let mut config = Config::default();
        config.logging.rotation = "weekly".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogRotation(_))
        ));
    }

    #[test]
    fn test_validate_request_timeout() {
        let mut config = Config::default();
        config.telegram.request_timeout_secs = 30;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidRequestTimeout(30, 30))
        ));
    }

    #[test]
    fn test_validate_for_telegram() {
        let mut config = Config::default();
        assert!(matches!(
            ConfigLoader::validate_for_telegram(&config),
            Err(ConfigError::MissingBotToken)
        ));
        config.telegram.bot_token = "123:abc".to_string();
        assert!(matches!(
            ConfigLoader::validate_for_telegram(&config),
            Err(ConfigError::MissingChannel("source_channel_id"))
        ));
        config.telegram.source_channel_id = -100;
        config.telegram.prediction_channel_id = -200;
        assert!(ConfigLoader::validate_for_telegram(&config).is_ok());
    }

    #[test]
    fn test_hierarchical_merging() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "engine:\n  offset: 4\n  max_concurrent: 3\nlogging:\n  level: info\n  format: json"
        )
        .unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "engine:\n  offset: 6\nlogging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.engine.offset, 6, "Override should win");
        assert_eq!(config.engine.max_concurrent, 3, "Base value should persist");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
    }
}
