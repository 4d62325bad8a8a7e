//! Long-polling loop feeding Telegram updates into the relay.
//!
//! Updates are handled one at a time in arrival order. Polling failures are
//! retried with exponential backoff capped at `restart_delay_secs`; the loop
//! only stops on shutdown.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use tracing::{debug, error, info, warn};

use super::client::TelegramClient;
use super::errors::TelegramApiError;
use super::types::Update;
use crate::domain::models::TelegramConfig;
use crate::services::RelayService;

/// What an update means to the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// New post in the source channel.
    SourcePost(String),
    /// Edited post in the source channel.
    SourceEdit(String),
    /// Private text that may be an admin command.
    Private { chat_id: i64, sender: i64, text: String },
    /// Anything else.
    Ignored,
}

/// Classify an update relative to the configured source channel.
pub fn classify(update: &Update, source_channel_id: i64) -> InboundEvent {
    if let Some(post) = &update.channel_post {
        if post.chat.id == source_channel_id {
            if let Some(text) = post.body() {
                return InboundEvent::SourcePost(text.to_string());
            }
        }
        return InboundEvent::Ignored;
    }

    if let Some(post) = &update.edited_channel_post {
        if post.chat.id == source_channel_id {
            if let Some(text) = post.body() {
                return InboundEvent::SourceEdit(text.to_string());
            }
        }
        return InboundEvent::Ignored;
    }

    if let Some(message) = &update.message {
        if message.chat.is_private() {
            if let (Some(from), Some(text)) = (&message.from, message.text.as_deref()) {
                return InboundEvent::Private {
                    chat_id: message.chat.id,
                    sender: from.id,
                    text: text.to_string(),
                };
            }
        }
    }

    InboundEvent::Ignored
}

/// Drives `getUpdates` and dispatches each update to the relay service
pub struct UpdatePoller {
    client: Arc<TelegramClient>,
    relay: Arc<RelayService>,
    source_channel_id: i64,
    poll_timeout_secs: u64,
    restart_delay: Duration,
    offset: Option<i64>,
}

impl UpdatePoller {
    pub fn new(client: Arc<TelegramClient>, relay: Arc<RelayService>, config: &TelegramConfig) -> Self {
        Self {
            client,
            relay,
            source_channel_id: config.source_channel_id,
            poll_timeout_secs: config.poll_timeout_secs,
            restart_delay: Duration::from_secs(config.restart_delay_secs.max(1)),
            offset: None,
        }
    }

    /// Poll until `shutdown` completes
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        let mut backoff = self.backoff();

        info!(source_channel_id = self.source_channel_id, "Polling for updates");

        loop {
            let batch = tokio::select! {
                () = &mut shutdown => {
                    info!("Shutdown requested, stopping poller");
                    return;
                }
                batch = self.client.get_updates(self.offset, self.poll_timeout_secs) => batch,
            };

            match batch {
                Ok(updates) => {
                    backoff.reset();
                    for update in updates {
                        self.offset = Some(update.update_id + 1);
                        self.dispatch(&update).await;
                    }
                }
                Err(err) => {
                    let delay = retry_delay(&err, &mut backoff, self.restart_delay);
                    error!(error = %err, delay_ms = delay.as_millis() as u64, "Polling failed, reconnecting");
                    tokio::select! {
                        () = &mut shutdown => {
                            info!("Shutdown requested, stopping poller");
                            return;
                        }
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    /// Handle one update
    pub async fn dispatch(&self, update: &Update) {
        match classify(update, self.source_channel_id) {
            InboundEvent::SourcePost(text) => {
                let report = self.relay.handle_source_message(&text).await;
                debug!(update_id = update.update_id, disposition = ?report.disposition, "Source post handled");
            }
            InboundEvent::SourceEdit(text) => {
                let report = self.relay.handle_source_edit(&text).await;
                debug!(update_id = update.update_id, disposition = ?report.disposition, "Source edit handled");
            }
            InboundEvent::Private {
                chat_id,
                sender,
                text,
            } => {
                let Some(reply) = self.relay.handle_admin_command(sender, &text).await else {
                    return;
                };
                if let Err(err) = self.client.send_message(chat_id, &reply).await {
                    warn!(chat_id, error = %err, "Failed to reply to admin command");
                }
            }
            InboundEvent::Ignored => {
                debug!(update_id = update.update_id, "Ignoring update");
            }
        }
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(500))
            .with_max_interval(self.restart_delay)
            .with_max_elapsed_time(None)
            .build()
    }
}

/// Delay before the next poll: flood control wins, then the backoff schedule.
fn retry_delay(err: &TelegramApiError, backoff: &mut ExponentialBackoff, cap: Duration) -> Duration {
    if let TelegramApiError::RateLimited { retry_after } = err {
        return Duration::from_secs(*retry_after);
    }
    backoff.next_backoff().unwrap_or(cap).min(cap)
}
