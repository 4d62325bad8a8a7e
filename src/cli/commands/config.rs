//! Configuration CLI commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::Path;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;

const REDACTED: &str = "[REDACTED]";

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration with secrets redacted
    Show,
    /// Check that the configuration is complete enough to run against Telegram
    Validate,
}

#[derive(Debug, Serialize)]
pub struct ConfigShowOutput {
    pub config: Config,
}

impl CommandOutput for ConfigShowOutput {
    fn to_human(&self) -> String {
        serde_yaml::to_string(&self.config).unwrap_or_else(|e| format!("<unprintable: {e}>"))
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct ConfigValidateOutput {
    pub valid: bool,
    pub offset: u64,
    pub continuation_policy: String,
    pub source_channel_id: i64,
    pub prediction_channel_id: i64,
}

impl CommandOutput for ConfigValidateOutput {
    fn to_human(&self) -> String {
        format!(
            "Configuration OK\n  offset: {}\n  continuation: {}\n  source channel: {}\n  prediction channel: {}",
            self.offset, self.continuation_policy, self.source_channel_id, self.prediction_channel_id
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: ConfigArgs, config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load_optional(config_path)?;

    match args.command {
        ConfigCommands::Show => {
            output(&ConfigShowOutput { config: redacted(config) }, json_mode);
        }
        ConfigCommands::Validate => {
            ConfigLoader::validate_for_telegram(&config)
                .context("Configuration is not ready for a live run")?;
            let out = ConfigValidateOutput {
                valid: true,
                offset: config.engine.offset,
                continuation_policy: config.engine.continuation_policy.as_str().to_string(),
                source_channel_id: config.telegram.source_channel_id,
                prediction_channel_id: config.telegram.prediction_channel_id,
            };
            output(&out, json_mode);
        }
    }

    Ok(())
}

/// Replace the bot token so `config show` never prints it.
pub fn redacted(mut config: Config) -> Config {
    if !config.telegram.bot_token.is_empty() {
        config.telegram.bot_token = REDACTED.to_string();
    }
    config
}
