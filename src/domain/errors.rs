//! Domain errors for the prediction relay.

use thiserror::Error;

/// Why the creation gate refused a new prediction.
///
/// These are expected outcomes, not failures: callers log them and move on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("all prediction slots are taken ({active}/{max})")]
    SlotsFull { active: usize, max: usize },

    #[error("a prediction for game {0} is already active")]
    DuplicateTarget(u64),

    #[error("no suit found in the first card group")]
    NoSuit,

    #[error("no game has been observed yet")]
    NoKnownGame,

    #[error("record is not eligible to trigger a prediction")]
    Disabled,

    #[error("target game {target} is not after the last observed game {last_game}")]
    StaleTarget { target: u64, last_game: u64 },

    #[error("target game for base {0} overflows")]
    TargetOverflow(u64),
}

/// A source message that cannot be turned into a game record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no game number found")]
    MissingGameNumber,

    #[error("game number out of range: {0}")]
    GameNumberOutOfRange(String),

    #[error("no card groups found for game {0}")]
    NoCardGroups(u64),
}

/// Invalid administrative mutation of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid offset: {0} (must be 1-50)")]
    InvalidOffset(u64),
}

/// Failure delivering a notification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rejected by remote: {0}")]
    Rejected(String),

    #[error("notification sink unavailable")]
    Unavailable,
}
