//! Admin control surface.
//!
//! Commands arrive as private chat text. Parsing and reply rendering live
//! here; [`crate::services::RelayService::handle_admin_command`] executes
//! them against the engine.

use std::fmt::Write as _;

use crate::domain::errors::{EngineError, RejectReason};
use crate::domain::models::{Prediction, PredictionStatus};
use crate::services::formatter;
use crate::services::prediction_engine::EngineSnapshot;

/// A recognized admin command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    Start,
    Help,
    Predict,
    ForceClear,
    /// `None` when the argument is missing or not a number.
    SetOffset(Option<u64>),
    Status,
    Transfer,
    StopTransfer,
}

impl AdminCommand {
    /// Parse `/command[@bot] [args]`. Anything else is not a command.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split_whitespace();
        let head = parts.next()?.strip_prefix('/')?;
        let name = head.split('@').next().unwrap_or(head).to_ascii_lowercase();

        let command = match name.as_str() {
            "start" => Self::Start,
            "help" => Self::Help,
            "predict" => Self::Predict,
            "forceclear" => Self::ForceClear,
            "setoffset" => Self::SetOffset(parts.next().and_then(|arg| arg.parse().ok())),
            "status" => Self::Status,
            "transfert" => Self::Transfer,
            "stoptransfert" => Self::StopTransfer,
            _ => return None,
        };
        Some(command)
    }

    /// Whether only the configured admin may run this command.
    pub const fn is_privileged(self) -> bool {
        matches!(
            self,
            Self::Predict | Self::ForceClear | Self::SetOffset(_) | Self::Status
        )
    }
}

/// Whether `sender` may run privileged commands. `admin_id == 0` allows everyone.
pub const fn is_authorized(sender: i64, admin_id: i64) -> bool {
    admin_id == 0 || sender == admin_id
}

pub const REPLY_FORBIDDEN: &str = "⛔ Réservé admin";
pub const REPLY_TRANSFER_ON: &str = "✅ Transfert ON";
pub const REPLY_TRANSFER_OFF: &str = "⛔ Transfert OFF";

pub fn start_text() -> String {
    format!(
        "🤖 Bot de Prédiction Baccarat\n\n\
         {}\n\n\
         Condition de victoire: au moins 1 carte de la couleur dans le premier groupe\n\n\
         Rattrapages:\n\
         • ✅0️⃣ = gagné au numéro prédit (N)\n\
         • ✅1️⃣ = gagné au 1er rattrapage (N+1)\n\
         • ✅2️⃣ = gagné au 2ème rattrapage (N+2)\n\
         • ✅3️⃣ = gagné au 3ème rattrapage (N+3)\n\
         • ❌ = perdu\n\n\
         Commandes:\n\
         • /predict - forcer une prédiction manuelle\n\
         • /status - voir les prédictions\n\
         • /setoffset <n> - changer le décalage\n\
         • /help - aide détaillée",
        FORMAT_EXAMPLE
    )
}

const FORMAT_EXAMPLE: &str = "📡 PRÉDICTION #N\n🎯 Couleur: [couleur] [nom]\n🌪️ Statut: ⏳ EN COURS";

pub fn help_text(offset: u64, max_lookahead: u8) -> String {
    format!(
        "📖 Aide\n\n\
         Format:\n{FORMAT_EXAMPLE}\n\n\
         Déroulement:\n\
         • Prédiction créée pour le jeu #N\n\
         • Attente de la finalisation de #N dans le canal source\n\
         • Au moins 1 carte de la couleur prédite ? → ✅ et arrêt\n\
         • Sinon rattrapage jusqu'à #N+{max_lookahead}, puis ❌\n\n\
         Commandes spéciales:\n\
         • /predict - force une prédiction manuelle\n\
         • /forceclear - supprime toutes les prédictions\n\
         • /status - état actuel\n\
         • /transfert, /stoptransfert - transfert des résultats finalisés\n\n\
         Décalage actuel: +{offset}"
    )
}

pub fn predict_created_text(prediction: &Prediction) -> String {
    format!(
        "✅ PRÉDICTION MANUELLE CRÉÉE\n\n{}\n\nBasé sur le jeu #{}",
        formatter::render_prediction(prediction),
        prediction.base_game
    )
}

pub fn predict_rejected_text(reason: RejectReason, active: &[u64]) -> String {
    match reason {
        RejectReason::SlotsFull { .. } => format!(
            "⛔ Impossible: prédiction(s) active(s) en cours: {active:?}\n\
             Attendez la finalisation ou utilisez /forceclear"
        ),
        RejectReason::DuplicateTarget(target) => format!("⛔ Prédiction #{target} existe déjà"),
        RejectReason::NoKnownGame => {
            "❌ Aucun jeu connu. Attendez un message du canal source d'abord.".to_string()
        }
        RejectReason::NoSuit => {
            "❌ Impossible d'extraire la couleur du dernier groupe".to_string()
        }
        RejectReason::Disabled => format!("❌ {reason}"),
        RejectReason::StaleTarget { target, .. } => format!("❌ Le jeu #{target} est déjà passé"),
        RejectReason::TargetOverflow(_) => "❌ Numéro de jeu hors limites".to_string(),
    }
}

pub fn force_clear_text(removed: usize) -> String {
    format!("🧹 {removed} prédiction(s) supprimée(s). Une nouvelle prédiction peut être créée.")
}

pub fn set_offset_usage(current: u64) -> String {
    format!("Usage: /setoffset <n>\nActuel: {current}")
}

pub fn set_offset_text(result: Result<u64, EngineError>, offset: u64) -> String {
    match result {
        Ok(_) => format!("✅ Décalage: +{offset}"),
        Err(EngineError::InvalidOffset(_)) => "Décalage: 1-50".to_string(),
    }
}

fn stage_label(stage: u8) -> String {
    match stage {
        0 => "N (prédit)".to_string(),
        1 => "1er rattrapage (N+1)".to_string(),
        k => format!("{k}ème rattrapage (N+{k})"),
    }
}

pub fn status_text(snapshot: &EngineSnapshot) -> String {
    let mut out = String::from("📊 État:\n\n");
    let last = snapshot
        .last_game
        .map_or_else(|| "-".to_string(), |g| format!("#{g}"));
    let _ = writeln!(out, "🎮 Dernier jeu: {last}");
    let _ = writeln!(out, "📏 Décalage: +{}", snapshot.offset);
    let _ = writeln!(out, "🔁 Rattrapages: {} maximum", snapshot.max_lookahead);
    let _ = writeln!(
        out,
        "🔒 Continuation: {}",
        snapshot.continuation_policy.as_str()
    );
    out.push('\n');

    if snapshot.active.is_empty() {
        out.push_str("🔮 Aucune prédiction active\n");
        out.push_str("💡 Utilisez /predict ou attendez un message source\n");
        return out;
    }

    let _ = writeln!(
        out,
        "🔮 Actives ({}/{}):",
        snapshot.active.len(),
        snapshot.max_concurrent
    );
    for prediction in &snapshot.active {
        let state = match prediction.status() {
            PredictionStatus::Pending => "⏳ EN COURS".to_string(),
            other => formatter::status_label(other),
        };
        let _ = writeln!(
            out,
            "• #{}: {}\n  → {} | {}",
            prediction.target_game,
            prediction.suit,
            stage_label(prediction.stage()),
            state
        );
    }
    out
}
