use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::errors::ParseError;
use crate::domain::models::{Config, MessageHandle, Prediction};
use crate::domain::ports::NotificationSink;
use crate::services::admin::{self, AdminCommand};
use crate::services::dedup::{Admission, RecentMessageFilter};
use crate::services::formatter;
use crate::services::message_parser;
use crate::services::prediction_engine::{EngineSnapshot, Observation, PredictionEngine};

/// What happened to one inbound source message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Parsed and fed to the engine.
    Processed,
    /// Could not be parsed into a game record.
    Malformed,
    /// Identical message already handled.
    Duplicate,
    /// A finalized message for the same game was already verified.
    AlreadyFinalized,
    /// Edited message that is not finalized.
    IgnoredEdit,
}

/// Report of one handled source message.
#[derive(Debug, Clone, Serialize)]
pub struct RelayReport {
    pub disposition: Disposition,
    /// Game number, when one could be parsed.
    pub game: Option<u64>,
    /// Parse failure for malformed messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Engine changes, for processed messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation: Option<Observation>,
    /// Predictions posted successfully.
    pub posted: usize,
    /// Resolved predictions edited successfully.
    pub edited: usize,
    /// Posts or edits that failed.
    pub sink_failures: usize,
    /// Whether the message was forwarded to the admin.
    pub forwarded: bool,
}

impl RelayReport {
    fn skipped(disposition: Disposition, game: Option<u64>) -> Self {
        Self {
            disposition,
            game,
            error: None,
            observation: None,
            posted: 0,
            edited: 0,
            sink_failures: 0,
            forwarded: false,
        }
    }

    fn malformed(err: &ParseError) -> Self {
        let game = match err {
            ParseError::NoCardGroups(game) => Some(*game),
            ParseError::MissingGameNumber | ParseError::GameNumberOutOfRange(_) => None,
        };
        Self {
            error: Some(err.to_string()),
            ..Self::skipped(Disposition::Malformed, game)
        }
    }
}

/// State guarded by a single lock so one message is handled at a time.
struct RelayState {
    engine: PredictionEngine,
    filter: RecentMessageFilter,
}

/// Service connecting the source channel, the engine and the notification sinks.
///
/// Each inbound message holds the state lock for its whole handling,
/// including sink calls, which keeps the engine single-writer.
pub struct RelayService {
    state: Mutex<RelayState>,
    sink: Arc<dyn NotificationSink>,
    admin_sink: Option<Arc<dyn NotificationSink>>,
    forward_enabled: AtomicBool,
    admin_id: i64,
}

impl RelayService {
    /// Create a new RelayService posting predictions to `sink`
    pub fn new(config: &Config, sink: Arc<dyn NotificationSink>) -> Self {
        let engine = PredictionEngine::new(config.engine.clone())
            .with_recent_capacity(config.relay.recent_games_capacity);
        let filter = RecentMessageFilter::new(
            config.relay.dedup_capacity,
            config.relay.finalized_capacity,
        );
        Self {
            state: Mutex::new(RelayState { engine, filter }),
            sink,
            admin_sink: None,
            forward_enabled: AtomicBool::new(config.relay.forward_finalized),
            admin_id: config.telegram.admin_id,
        }
    }

    /// Sink for forwarding finalized source messages to the admin.
    #[must_use]
    pub fn with_admin_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.admin_sink = Some(sink);
        self
    }

    pub fn forwarding_enabled(&self) -> bool {
        self.forward_enabled.load(Ordering::Relaxed)
    }

    pub fn set_forwarding(&self, enabled: bool) {
        self.forward_enabled.store(enabled, Ordering::Relaxed);
        info!(enabled, "Finalized message forwarding changed");
    }

    pub async fn snapshot(&self) -> EngineSnapshot {
        self.state.lock().await.engine.snapshot()
    }

    /// Handle a new message from the source channel.
    ///
    /// # Steps:
    /// 1. Parse the game record
    /// 2. Drop duplicates and already verified games
    /// 3. Feed the engine
    /// 4. Post created predictions and edit resolved ones
    /// 5. Forward finalized messages to the admin
    #[instrument(skip(self, text))]
    pub async fn handle_source_message(&self, text: &str) -> RelayReport {
        let record = match message_parser::parse_record(text) {
            Ok(record) => record,
            Err(err) => {
                warn!(error = %err, "Dropping malformed source message");
                return RelayReport::malformed(&err);
            }
        };
        let game = record.sequence;

        let mut state = self.state.lock().await;

        match state.filter.admit(game, text, record.finalized) {
            Admission::Fresh => {}
            Admission::Duplicate => {
                debug!(game, "Duplicate source message ignored");
                return RelayReport::skipped(Disposition::Duplicate, Some(game));
            }
            Admission::AlreadyFinalized => {
                debug!(game, "Game already verified");
                return RelayReport::skipped(Disposition::AlreadyFinalized, Some(game));
            }
        }

        info!(game, finalized = record.finalized, groups = record.groups.len(), "Source record accepted");
        let observation = state.engine.observe(&record);

        let mut report = RelayReport::skipped(Disposition::Processed, Some(game));

        for prediction in &observation.created {
            match self.post_prediction(prediction).await {
                Some(handle) => {
                    state.engine.attach_handle(prediction.target_game, handle);
                    report.posted += 1;
                }
                None => report.sink_failures += 1,
            }
        }

        for prediction in &observation.resolved {
            let Some(handle) = prediction.handle else {
                debug!(target_game = prediction.target_game, "Resolved prediction has no message to edit");
                continue;
            };
            let text = formatter::render_prediction(prediction);
            match self.sink.edit(handle, &text).await {
                Ok(()) => report.edited += 1,
                Err(err) => {
                    error!(target_game = prediction.target_game, %handle, error = %err, "Failed to edit prediction");
                    report.sink_failures += 1;
                }
            }
        }

        drop(state);

        if record.finalized {
            report.forwarded = self.forward(text).await;
        }

        report.observation = Some(observation);
        report
    }

    /// Handle an edit of an earlier source message; only finalized edits count.
    #[instrument(skip(self, text))]
    pub async fn handle_source_edit(&self, text: &str) -> RelayReport {
        if !message_parser::is_finalized(text) {
            let game = message_parser::parse_game_number(text);
            debug!(?game, "Ignoring non-finalized edit");
            return RelayReport::skipped(Disposition::IgnoredEdit, game);
        }
        self.handle_source_message(text).await
    }

    /// Execute an admin command and return the reply, or `None` for non-commands.
    #[instrument(skip(self, text))]
    pub async fn handle_admin_command(&self, sender: i64, text: &str) -> Option<String> {
        let command = AdminCommand::parse(text)?;

        if command.is_privileged() && !admin::is_authorized(sender, self.admin_id) {
            warn!(sender, ?command, "Unauthorized admin command");
            return Some(admin::REPLY_FORBIDDEN.to_string());
        }

        info!(sender, ?command, "Admin command");
        let reply = match command {
            AdminCommand::Start => admin::start_text(),
            AdminCommand::Help => {
                let state = self.state.lock().await;
                let config = state.engine.config();
                admin::help_text(config.offset, config.max_lookahead)
            }
            AdminCommand::Predict => self.manual_predict().await,
            AdminCommand::ForceClear => {
                let removed = self.state.lock().await.engine.force_clear();
                admin::force_clear_text(removed)
            }
            AdminCommand::SetOffset(None) => {
                let offset = self.state.lock().await.engine.offset();
                admin::set_offset_usage(offset)
            }
            AdminCommand::SetOffset(Some(offset)) => {
                let result = self.state.lock().await.engine.set_offset(offset);
                admin::set_offset_text(result, offset)
            }
            AdminCommand::Status => admin::status_text(&self.snapshot().await),
            AdminCommand::Transfer => {
                self.set_forwarding(true);
                admin::REPLY_TRANSFER_ON.to_string()
            }
            AdminCommand::StopTransfer => {
                self.set_forwarding(false);
                admin::REPLY_TRANSFER_OFF.to_string()
            }
        };
        Some(reply)
    }

    async fn manual_predict(&self) -> String {
        let mut state = self.state.lock().await;
        match state.engine.manual_predict() {
            Ok(prediction) => {
                if let Some(handle) = self.post_prediction(&prediction).await {
                    state.engine.attach_handle(prediction.target_game, handle);
                }
                admin::predict_created_text(&prediction)
            }
            Err(reason) => {
                info!(%reason, "Manual prediction rejected");
                let active: Vec<u64> = state.engine.active().map(|p| p.target_game).collect();
                admin::predict_rejected_text(reason, &active)
            }
        }
    }

    async fn post_prediction(&self, prediction: &Prediction) -> Option<MessageHandle> {
        let text = formatter::render_prediction(prediction);
        match self.sink.post(&text).await {
            Ok(handle) => {
                debug!(target_game = prediction.target_game, %handle, "Prediction posted");
                Some(handle)
            }
            Err(err) => {
                error!(target_game = prediction.target_game, error = %err, "Failed to post prediction");
                None
            }
        }
    }

    async fn forward(&self, text: &str) -> bool {
        if !self.forwarding_enabled() {
            return false;
        }
        let Some(admin_sink) = &self.admin_sink else {
            return false;
        };
        match admin_sink.post(&formatter::render_forward(text)).await {
            Ok(_) => true,
            Err(err) => {
                warn!(error = %err, "Failed to forward finalized message");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::NullNotificationSink;

    fn service() -> RelayService {
        RelayService::new(&Config::default(), Arc::new(NullNotificationSink::new()))
    }

    #[tokio::test]
    async fn test_malformed_message_is_dropped() {
        let relay = service();
        let report = relay.handle_source_message("hello").await;
        assert_eq!(report.disposition, Disposition::Malformed);
        assert!(report.game.is_none());
        assert!(relay.snapshot().await.last_game.is_none());
    }

    #[tokio::test]
    async fn test_failed_post_still_tracks_prediction() {
        let relay = service();
        let report = relay.handle_source_message("#N718. 0(A♥) ⏳").await;
        assert_eq!(report.disposition, Disposition::Processed);
        assert_eq!(report.posted, 0);
        assert_eq!(report.sink_failures, 1);

        let snapshot = relay.snapshot().await;
        assert_eq!(snapshot.active.len(), 1);
        assert!(snapshot.active[0].handle.is_none());

        let report = relay.handle_source_message("#N720. 2(K♥) ✅").await;
        let observation = report.observation.unwrap();
        assert_eq!(observation.resolved.len(), 1);
        assert_eq!(report.edited, 0);
        assert_eq!(report.sink_failures, 0);
    }

    #[tokio::test]
    async fn test_non_finalized_edit_is_ignored() {
        let relay = service();
        let report = relay.handle_source_edit("#N9. 1(A♠) ⏰").await;
        assert_eq!(report.disposition, Disposition::IgnoredEdit);
        assert_eq!(report.game, Some(9));
    }

    #[tokio::test]
    async fn test_unauthorized_privileged_command() {
        let mut config = Config::default();
        config.telegram.admin_id = 42;
        let relay = RelayService::new(&config, Arc::new(NullNotificationSink::new()));
        assert_eq!(
            relay.handle_admin_command(7, "/forceclear").await.as_deref(),
            Some(admin::REPLY_FORBIDDEN)
        );
        assert!(relay.handle_admin_command(7, "/help").await.is_some());
        assert!(relay.handle_admin_command(42, "/status").await.is_some());
        assert!(relay.handle_admin_command(42, "not a command").await.is_none());
    }

    #[tokio::test]
    async fn test_transfer_toggle() {
        let relay = service();
        assert!(relay.forwarding_enabled());
        relay.handle_admin_command(0, "/stoptransfert").await;
        assert!(!relay.forwarding_enabled());
        relay.handle_admin_command(0, "/transfert").await;
        assert!(relay.forwarding_enabled());
    }
}
