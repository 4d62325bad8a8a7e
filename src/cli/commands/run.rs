//! Live relay against the Telegram Bot API.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::domain::ports::NotificationSink;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::{LogConfig, LoggerImpl};
use crate::infrastructure::telegram::{TelegramClient, TelegramSink, UpdatePoller};
use crate::services::RelayService;

/// Run the relay until Ctrl-C.
///
/// Installs its own subscriber from the `logging` config section, so `main`
/// must not install one before calling this.
pub async fn execute(config_path: Option<&Path>) -> Result<()> {
    let config = ConfigLoader::load_optional(config_path)?;
    ConfigLoader::validate_for_telegram(&config)?;

    let _logger = LoggerImpl::init(&LogConfig::from(&config.logging))
        .context("Failed to initialize logging")?;

    let client = Arc::new(TelegramClient::with_config(&config.telegram)?);
    let sink: Arc<dyn NotificationSink> = Arc::new(TelegramSink::new(
        Arc::clone(&client),
        config.telegram.prediction_channel_id,
    ));

    let mut relay = RelayService::new(&config, sink);
    if config.telegram.admin_id != 0 {
        relay = relay.with_admin_sink(Arc::new(TelegramSink::new(
            Arc::clone(&client),
            config.telegram.admin_id,
        )));
    }
    let relay = Arc::new(relay);

    info!(
        source = config.telegram.source_channel_id,
        predictions = config.telegram.prediction_channel_id,
        offset = config.engine.offset,
        policy = config.engine.continuation_policy.as_str(),
        "Relay starting"
    );

    let poller = UpdatePoller::new(client, relay, &config.telegram);
    poller
        .run(async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!("Relay stopped");
    Ok(())
}
