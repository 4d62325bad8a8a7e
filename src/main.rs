//! Baccarat relay entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use baccarat_relay::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    // `run` installs its own subscriber from the logging config
    if !matches!(cli.command, Commands::Run) {
        tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let result = match cli.command {
        Commands::Run => baccarat_relay::cli::commands::run::execute(config_path).await,
        Commands::Replay(args) => {
            baccarat_relay::cli::commands::replay::execute(args, config_path, cli.json).await
        }
        Commands::Config(args) => {
            baccarat_relay::cli::commands::config::execute(args, config_path, cli.json).await
        }
    };

    if let Err(err) = result {
        baccarat_relay::cli::handle_error(err, cli.json);
    }
}
