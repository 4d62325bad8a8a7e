//! Notification text for predictions.
//!
//! Rendering is pure: the same prediction always produces the same text, so
//! an edit can be re-sent safely.

use crate::domain::models::{Prediction, PredictionStatus, Suit};

const STATUS_PENDING: &str = "⏳ EN COURS";
const STATUS_WON: &str = "✅";
const STATUS_LOST: &str = "❌";

/// Keycap emoji for a single digit, `None` outside 0-9.
pub fn keycap(digit: u8) -> Option<String> {
    (digit <= 9).then(|| format!("{digit}\u{FE0F}\u{20E3}"))
}

/// Status line glyphs.
pub fn status_label(status: PredictionStatus) -> String {
    match status {
        PredictionStatus::Pending => STATUS_PENDING.to_string(),
        PredictionStatus::WonAtStage(stage) => match keycap(stage) {
            Some(cap) => format!("{STATUS_WON}{cap}"),
            None => format!("{STATUS_WON}{stage}"),
        },
        PredictionStatus::Lost => STATUS_LOST.to_string(),
    }
}

/// Full message for a target game, suit and status.
pub fn render(target_game: u64, suit: Suit, status: PredictionStatus) -> String {
    format!(
        "📡 PRÉDICTION #{target_game}\n🎯 Couleur: {} {}\n🌪️ Statut: {}",
        suit.display(),
        suit.name(),
        status_label(status)
    )
}

/// Message for a prediction in its current status.
pub fn render_prediction(prediction: &Prediction) -> String {
    render(prediction.target_game, prediction.suit, prediction.status())
}

/// Forwarded copy of a finalized source message.
pub fn render_forward(text: &str) -> String {
    format!("📨 Message finalisé:\n\n{text}")
}
