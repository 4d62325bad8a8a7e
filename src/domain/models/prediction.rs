//! Prediction lifecycle model.
//!
//! A prediction claims that the first card group of `target_game` will
//! contain at least one card of `suit`. When it does not, the claim rolls
//! forward to `target_game + 1`, `+ 2`, ... up to the configured lookahead
//! before it is declared lost.
//!
//! ```text
//! Pending(0) --miss--> Pending(1) --miss--> ... Pending(L) --miss--> Lost
//!     |                    |                        |
//!    hit                  hit                      hit
//!     v                    v                        v
//! WonAtStage(0)       WonAtStage(1)            WonAtStage(L)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::suit::Suit;

/// Opaque reference to a posted notification, used for in-place edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageHandle(pub i64);

impl MessageHandle {
    /// Wrap a transport message id.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw transport message id.
    pub const fn raw(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for MessageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "msg:{}", self.0)
    }
}

/// Lifecycle status of a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status", content = "stage", rename_all = "snake_case")]
pub enum PredictionStatus {
    /// Waiting for the game at `target_game + stage`.
    Pending,
    /// The suit appeared at `target_game + k`.
    WonAtStage(u8),
    /// No check inside the lookahead window matched.
    Lost,
}

impl PredictionStatus {
    /// Whether this status ends the lifecycle.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Whether this is a win at any stage.
    pub const fn is_win(self) -> bool {
        matches!(self, Self::WonAtStage(_))
    }
}

/// Why a prediction was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionOrigin {
    /// Triggered by an inbound game record.
    Observed,
    /// Requested through the admin surface.
    Manual,
    /// Chained after a resolution with the just-finalized suit.
    Continuation,
    /// Follow-up with the paired suit after a loss.
    Backup,
}

impl PredictionOrigin {
    /// Lowercase label for logs and reports.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Observed => "observed",
            Self::Manual => "manual",
            Self::Continuation => "continuation",
            Self::Backup => "backup",
        }
    }
}

/// Outcome of checking one finalized game against a pending prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The suit was present; the prediction is won at the given stage.
    Won(u8),
    /// The suit was absent; the prediction now waits on the given stage.
    Advanced(u8),
    /// The suit was absent on the last stage of the window.
    Lost,
}

/// A forecast that the first card group of `target_game` contains `suit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    /// Game the claim is about. Set once at creation.
    pub target_game: u64,

    /// Predicted suit.
    pub suit: Suit,

    /// Game whose record triggered creation.
    pub base_game: u64,

    /// Number of failed checks so far.
    stage: u8,

    /// Current lifecycle status.
    status: PredictionStatus,

    /// Posted notification, `None` when posting failed or has not happened yet.
    pub handle: Option<MessageHandle>,

    /// What caused the prediction.
    pub origin: PredictionOrigin,

    /// Last game number checked against this prediction.
    pub last_checked_game: Option<u64>,

    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Prediction {
    /// Create a pending prediction at stage 0.
    pub fn new(target_game: u64, suit: Suit, base_game: u64, origin: PredictionOrigin) -> Self {
        Self {
            target_game,
            suit,
            base_game,
            stage: 0,
            status: PredictionStatus::Pending,
            handle: None,
            origin,
            last_checked_game: None,
            created_at: Utc::now(),
        }
    }

    /// Failed checks so far.
    pub const fn stage(&self) -> u8 {
        self.stage
    }

    /// Current status.
    pub const fn status(&self) -> PredictionStatus {
        self.status
    }

    /// Whether the prediction is still waiting for a result.
    pub const fn is_pending(&self) -> bool {
        matches!(self.status, PredictionStatus::Pending)
    }

    /// Game number the next check must come from, `None` past `u64::MAX`.
    pub const fn expected_game(&self) -> Option<u64> {
        self.target_game.checked_add(self.stage as u64)
    }

    /// Check a finalized first group observed for [`Self::expected_game`].
    ///
    /// A hit wins at the current stage. A miss advances the stage by one and
    /// loses once the stage would pass `max_lookahead`. Calling this on a
    /// terminal prediction is a no-op that reports its existing outcome.
    pub fn check(&mut self, game: u64, group: &str, max_lookahead: u8) -> CheckOutcome {
        match self.status {
            PredictionStatus::WonAtStage(k) => return CheckOutcome::Won(k),
            PredictionStatus::Lost => return CheckOutcome::Lost,
            PredictionStatus::Pending => {}
        }

        self.last_checked_game = Some(game);

        if self.suit.count_in(group) >= 1 {
            self.status = PredictionStatus::WonAtStage(self.stage);
            return CheckOutcome::Won(self.stage);
        }

        let exhausted = self.stage >= max_lookahead;
        self.stage = self.stage.saturating_add(1);
        if exhausted {
            self.status = PredictionStatus::Lost;
            CheckOutcome::Lost
        } else {
            CheckOutcome::Advanced(self.stage)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hearts_at_720() -> Prediction {
        Prediction::new(720, Suit::Hearts, 718, PredictionOrigin::Observed)
    }

    #[test]
    fn test_new_prediction_is_pending_at_stage_zero() {
        let p = hearts_at_720();
        assert!(p.is_pending());
        assert_eq!(p.stage(), 0);
        assert_eq!(p.expected_game(), Some(720));
        assert!(p.handle.is_none());
    }

    #[test]
    fn test_hit_wins_at_current_stage() {
        let mut p = hearts_at_720();
        assert_eq!(p.check(720, "Q♦5♥A♥", 3), CheckOutcome::Won(0));
        assert_eq!(p.status(), PredictionStatus::WonAtStage(0));
        assert_eq!(p.last_checked_game, Some(720));
    }

    #[test]
    fn test_expected_game_at_upper_bound() {
        let mut p = Prediction::new(u64::MAX, Suit::Hearts, u64::MAX - 2, PredictionOrigin::Observed);
        assert_eq!(p.expected_game(), Some(u64::MAX));
        p.check(u64::MAX, "2♣", 3);
        assert_eq!(p.expected_game(), None);
    }

    #[test]
    fn test_miss_advances_stage() {
        let mut p = hearts_at_720();
        assert_eq!(p.check(720, "Q♦5♦A♦", 3), CheckOutcome::Advanced(1));
        assert!(p.is_pending());
        assert_eq!(p.expected_game(), Some(721));
        assert_eq!(p.check(721, "K♥2♣", 3), CheckOutcome::Won(1));
    }

    #[test]
    fn test_four_misses_lose() {
        let mut p = hearts_at_720();
        for (game, expected) in [(720, 1), (721, 2), (722, 3)] {
            assert_eq!(p.check(game, "2♣", 3), CheckOutcome::Advanced(expected));
        }
        assert_eq!(p.check(723, "2♣", 3), CheckOutcome::Lost);
        assert_eq!(p.status(), PredictionStatus::Lost);
        assert_eq!(p.stage(), 4);
    }

    #[test]
    fn test_zero_lookahead_is_single_shot() {
        let mut p = hearts_at_720();
        assert_eq!(p.check(720, "2♣", 0), CheckOutcome::Lost);
    }

    #[test]
    fn test_terminal_check_is_noop() {
        let mut p = hearts_at_720();
        p.check(720, "A♥", 3);
        assert_eq!(p.check(721, "2♣", 3), CheckOutcome::Won(0));
        assert_eq!(p.status(), PredictionStatus::WonAtStage(0));
        assert_eq!(p.last_checked_game, Some(720));
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&PredictionStatus::WonAtStage(2)).unwrap();
        assert_eq!(json, r#"{"status":"won_at_stage","stage":2}"#);
        let json = serde_json::to_string(&PredictionStatus::Pending).unwrap();
        assert_eq!(json, r#"{"status":"pending"}"#);
    }
}
