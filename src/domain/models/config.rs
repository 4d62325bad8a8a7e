use serde::{Deserialize, Serialize};

use super::suit::SuitPairTable;

/// Main configuration structure for the relay
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Prediction engine configuration
    #[serde(default)]
    pub engine: EngineConfig,

    /// Relay pipeline configuration
    #[serde(default)]
    pub relay: RelayConfig,

    /// Telegram transport configuration
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// What happens after a prediction reaches a terminal status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinuationPolicy {
    /// Wait for the next eligible record or a manual request.
    #[default]
    None,
    /// Immediately predict again from the record that resolved the prediction.
    AutoChain,
    /// On loss only, predict the paired suit.
    BackupOnLoss,
}

impl ContinuationPolicy {
    /// Config-file spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::AutoChain => "auto_chain",
            Self::BackupOnLoss => "backup_on_loss",
        }
    }
}

/// Game number a backup prediction is offset from.
///
/// A loss is only known at the resolving game, so a `Target` backup whose
/// game has already been observed is rejected as stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupAnchor {
    /// `lost.target_game + offset`
    Target,
    /// `resolving_game + offset`
    #[default]
    Observed,
}

/// Which inbound records may trigger a new prediction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreationTrigger {
    /// Only provisional records create; finalized records only verify.
    #[default]
    NonFinalizedOnly,
    /// Every record may create, finalized or not.
    EveryRecord,
}

/// Prediction engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Distance between the triggering game and the predicted game (1-50)
    #[serde(default = "default_offset")]
    pub offset: u64,

    /// Maximum simultaneously pending predictions
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Catch-up checks after the target game (0-9)
    #[serde(default = "default_max_lookahead")]
    pub max_lookahead: u8,

    /// Behavior after a terminal resolution
    #[serde(default)]
    pub continuation_policy: ContinuationPolicy,

    /// Anchor for backup targets
    #[serde(default)]
    pub backup_anchor: BackupAnchor,

    /// Which records may create predictions
    #[serde(default)]
    pub creation_trigger: CreationTrigger,

    /// Suit pairing used for backups
    #[serde(default)]
    pub suit_pairs: SuitPairTable,
}

const fn default_offset() -> u64 {
    2
}

const fn default_max_concurrent() -> usize {
    1
}

const fn default_max_lookahead() -> u8 {
    3
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            offset: default_offset(),
            max_concurrent: default_max_concurrent(),
            max_lookahead: default_max_lookahead(),
            continuation_policy: ContinuationPolicy::default(),
            backup_anchor: BackupAnchor::default(),
            creation_trigger: CreationTrigger::default(),
            suit_pairs: SuitPairTable::default(),
        }
    }
}

/// Relay pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RelayConfig {
    /// Remembered message fingerprints for duplicate suppression
    #[serde(default = "default_dedup_capacity")]
    pub dedup_capacity: usize,

    /// Remembered finalized game numbers
    #[serde(default = "default_finalized_capacity")]
    pub finalized_capacity: usize,

    /// Remembered first groups of recent games
    #[serde(default = "default_recent_games_capacity")]
    pub recent_games_capacity: usize,

    /// Forward finalized source messages to the admin chat
    #[serde(default = "default_true")]
    pub forward_finalized: bool,
}

const fn default_dedup_capacity() -> usize {
    200
}

const fn default_finalized_capacity() -> usize {
    100
}

const fn default_recent_games_capacity() -> usize {
    100
}

const fn default_true() -> bool {
    true
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            dedup_capacity: default_dedup_capacity(),
            finalized_capacity: default_finalized_capacity(),
            recent_games_capacity: default_recent_games_capacity(),
            forward_finalized: default_true(),
        }
    }
}

/// Telegram transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TelegramConfig {
    /// Bot API token
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bot_token: String,

    /// Bot API base URL (for testing/proxies)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Channel game results are read from
    #[serde(default)]
    pub source_channel_id: i64,

    /// Channel predictions are posted to
    #[serde(default)]
    pub prediction_channel_id: i64,

    /// User allowed to run admin commands; 0 allows everyone
    #[serde(default)]
    pub admin_id: i64,

    /// Long-poll timeout for getUpdates
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,

    /// Upper bound on the reconnect delay after a polling failure
    #[serde(default = "default_restart_delay_secs")]
    pub restart_delay_secs: u64,

    /// HTTP request timeout; must exceed the poll timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

const fn default_poll_timeout_secs() -> u64 {
    30
}

const fn default_restart_delay_secs() -> u64 {
    10
}

const fn default_request_timeout_secs() -> u64 {
    45
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base_url: default_api_base_url(),
            source_channel_id: 0,
            prediction_channel_id: 0,
            admin_id: 0,
            poll_timeout_secs: default_poll_timeout_secs(),
            restart_delay_secs: default_restart_delay_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    /// File rotation: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
