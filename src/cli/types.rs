//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "baccarat-relay")]
#[command(about = "Baccarat prediction relay for Telegram channels", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Config file (defaults to relay.yaml + relay.local.yaml in the working directory)
    #[arg(short, long, global = true, env = "RELAY_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the relay against Telegram until interrupted
    Run,

    /// Feed recorded source messages through the relay with an in-memory sink
    Replay(crate::cli::commands::replay::ReplayArgs),

    /// Configuration commands
    Config(crate::cli::commands::config::ConfigArgs),
}
