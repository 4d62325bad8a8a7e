//! Prediction lifecycle engine.
//!
//! Owns the active prediction set and drives every transition: creation
//! through a single gate, verification of finalized records against the
//! lookahead window, and continuation after a terminal resolution.
//!
//! The engine is synchronous and performs no I/O. It reports what changed
//! in an [`Observation`] so the caller can post and edit notifications.
//! Callers that share an engine across tasks must serialize access to it;
//! the slot check and the stage advance are read-modify-write steps that
//! must not interleave.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::domain::errors::{EngineError, RejectReason};
use crate::domain::models::{
    extract_first_suit, BackupAnchor, CheckOutcome, ContinuationPolicy, CreationTrigger,
    EngineConfig, GameRecord, MessageHandle, Prediction, PredictionOrigin, Suit,
};

/// Valid range for the prediction offset.
pub const OFFSET_RANGE: std::ops::RangeInclusive<u64> = 1..=50;

/// Default number of remembered first groups.
const DEFAULT_RECENT_CAPACITY: usize = 100;

/// A creation attempt the gate refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rejection {
    /// What would have created the prediction.
    pub origin: PredictionOrigin,
    /// Why it was refused.
    #[serde(serialize_with = "serialize_reason")]
    pub reason: RejectReason,
}

fn serialize_reason<S: serde::Serializer>(reason: &RejectReason, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(reason)
}

/// Everything that changed while observing one record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Observation {
    /// Sequence number of the observed record.
    pub game: u64,
    /// Predictions created, in creation order. They have no handle yet.
    pub created: Vec<Prediction>,
    /// Pending predictions that missed and moved to the next stage.
    pub advanced: Vec<Prediction>,
    /// Predictions that reached a terminal status and left the active set.
    pub resolved: Vec<Prediction>,
    /// Creation attempts refused by the gate.
    pub rejected: Vec<Rejection>,
}

impl Observation {
    fn new(game: u64) -> Self {
        Self {
            game,
            ..Self::default()
        }
    }

    /// Whether the record changed nothing.
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.advanced.is_empty() && self.resolved.is_empty()
    }
}

/// Serializable view of the engine for status reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineSnapshot {
    pub offset: u64,
    pub max_concurrent: usize,
    pub max_lookahead: u8,
    pub continuation_policy: ContinuationPolicy,
    pub creation_trigger: CreationTrigger,
    pub last_game: Option<u64>,
    /// Active predictions ordered by target game.
    pub active: Vec<Prediction>,
}

/// The prediction lifecycle state machine.
#[derive(Debug, Clone)]
pub struct PredictionEngine {
    config: EngineConfig,
    active: BTreeMap<u64, Prediction>,
    last_game: Option<u64>,
    recent_groups: BTreeMap<u64, String>,
    recent_capacity: usize,
}

impl PredictionEngine {
    /// Create an engine with an empty active set.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            active: BTreeMap::new(),
            last_game: None,
            recent_groups: BTreeMap::new(),
            recent_capacity: DEFAULT_RECENT_CAPACITY,
        }
    }

    /// Set how many recent first groups are remembered for manual predictions.
    #[must_use]
    pub fn with_recent_capacity(mut self, capacity: usize) -> Self {
        self.recent_capacity = capacity.max(1);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn offset(&self) -> u64 {
        self.config.offset
    }

    pub fn last_game(&self) -> Option<u64> {
        self.last_game
    }

    /// Number of pending predictions.
    pub fn pending_count(&self) -> usize {
        self.active.values().filter(|p| p.is_pending()).count()
    }

    /// Active prediction for a target game, if any.
    pub fn get(&self, target_game: u64) -> Option<&Prediction> {
        self.active.get(&target_game)
    }

    /// Active predictions ordered by target game.
    pub fn active(&self) -> impl Iterator<Item = &Prediction> {
        self.active.values()
    }

    /// Try to create a prediction from a record, ignoring the creation trigger.
    ///
    /// Gate order: a target after the last observed game, then a free slot,
    /// then a unique target, then an extractable suit.
    pub fn try_create(&mut self, record: &GameRecord) -> Result<Prediction, RejectReason> {
        self.admit(record.sequence, record.first_suit(), PredictionOrigin::Observed)
    }

    /// Feed one record through creation, verification and continuation.
    ///
    /// Records must arrive in non-decreasing sequence order and already be
    /// deduplicated.
    pub fn observe(&mut self, record: &GameRecord) -> Observation {
        let game = record.sequence;
        let mut observation = Observation::new(game);

        self.remember(record);

        let verification_only = record.finalized
            && self.config.creation_trigger == CreationTrigger::NonFinalizedOnly;
        let created = if verification_only {
            Err(RejectReason::Disabled)
        } else {
            self.try_create(record)
        };
        self.collect(&mut observation, PredictionOrigin::Observed, created);

        if !record.finalized {
            return observation;
        }

        let Some(group) = record.first_group() else {
            return observation;
        };

        self.verify(game, group, &mut observation);

        let resolved = observation.resolved.clone();
        for prediction in &resolved {
            self.continue_after(prediction, record, &mut observation);
        }

        observation
    }

    /// Create a prediction from the last observed game.
    pub fn manual_predict(&mut self) -> Result<Prediction, RejectReason> {
        let base = self.last_game.ok_or(RejectReason::NoKnownGame)?;
        let suit = self
            .recent_groups
            .get(&base)
            .map(String::as_str)
            .and_then(extract_first_suit);
        self.admit(base, suit, PredictionOrigin::Manual)
    }

    /// Record the posted notification for an active prediction.
    ///
    /// Returns false when no active prediction targets that game.
    pub fn attach_handle(&mut self, target_game: u64, handle: MessageHandle) -> bool {
        match self.active.get_mut(&target_game) {
            Some(prediction) => {
                prediction.handle = Some(handle);
                true
            }
            None => false,
        }
    }

    /// Drop every active prediction and return how many were removed.
    pub fn force_clear(&mut self) -> usize {
        let removed = self.active.len();
        self.active.clear();
        info!(removed, "Active predictions cleared");
        removed
    }

    /// Change the offset for future predictions and return the previous one.
    pub fn set_offset(&mut self, offset: u64) -> Result<u64, EngineError> {
        if !OFFSET_RANGE.contains(&offset) {
            return Err(EngineError::InvalidOffset(offset));
        }
        let previous = std::mem::replace(&mut self.config.offset, offset);
        info!(previous, offset, "Prediction offset changed");
        Ok(previous)
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            offset: self.config.offset,
            max_concurrent: self.config.max_concurrent,
            max_lookahead: self.config.max_lookahead,
            continuation_policy: self.config.continuation_policy,
            creation_trigger: self.config.creation_trigger,
            last_game: self.last_game,
            active: self.active.values().cloned().collect(),
        }
    }

    fn remember(&mut self, record: &GameRecord) {
        self.last_game = Some(record.sequence);
        if let Some(group) = record.first_group() {
            self.recent_groups.insert(record.sequence, group.to_string());
        }
        while self.recent_groups.len() > self.recent_capacity {
            self.recent_groups.pop_first();
        }
    }

    fn admit(
        &mut self,
        base_game: u64,
        suit: Option<Suit>,
        origin: PredictionOrigin,
    ) -> Result<Prediction, RejectReason> {
        let target_game = base_game
            .checked_add(self.config.offset)
            .ok_or(RejectReason::TargetOverflow(base_game))?;
        if let Some(last_game) = self.last_game.filter(|&last| target_game <= last) {
            return Err(RejectReason::StaleTarget {
                target: target_game,
                last_game,
            });
        }
        let pending = self.pending_count();
        if pending >= self.config.max_concurrent {
            return Err(RejectReason::SlotsFull {
                active: pending,
                max: self.config.max_concurrent,
            });
        }
        if self.active.contains_key(&target_game) {
            return Err(RejectReason::DuplicateTarget(target_game));
        }
        let suit = suit.ok_or(RejectReason::NoSuit)?;

        let prediction = Prediction::new(target_game, suit, base_game, origin);
        info!(
            target_game,
            base_game,
            suit = %suit,
            origin = origin.as_str(),
            "Prediction created"
        );
        self.active.insert(target_game, prediction.clone());
        Ok(prediction)
    }

    fn collect(
        &self,
        observation: &mut Observation,
        origin: PredictionOrigin,
        result: Result<Prediction, RejectReason>,
    ) {
        match result {
            Ok(prediction) => observation.created.push(prediction),
            Err(reason) => {
                debug!(game = observation.game, origin = origin.as_str(), %reason, "Creation rejected");
                observation.rejected.push(Rejection { origin, reason });
            }
        }
    }

    fn verify(&mut self, game: u64, group: &str, observation: &mut Observation) {
        let lookahead = self.config.max_lookahead;
        let mut finished = Vec::new();

        for (&target, prediction) in self.active.iter_mut() {
            if !prediction.is_pending() || prediction.expected_game() != Some(game) {
                continue;
            }
            match prediction.check(game, group, lookahead) {
                CheckOutcome::Won(stage) => {
                    info!(target_game = target, game, stage, suit = %prediction.suit, "Prediction won");
                    finished.push(target);
                }
                CheckOutcome::Lost => {
                    info!(target_game = target, game, suit = %prediction.suit, "Prediction lost");
                    finished.push(target);
                }
                CheckOutcome::Advanced(stage) => {
                    info!(target_game = target, game, stage, "Prediction advanced to next stage");
                    observation.advanced.push(prediction.clone());
                }
            }
        }

        for target in finished {
            if let Some(prediction) = self.active.remove(&target) {
                observation.resolved.push(prediction);
            }
        }
    }

    fn continue_after(
        &mut self,
        resolved: &Prediction,
        record: &GameRecord,
        observation: &mut Observation,
    ) {
        let game = record.sequence;

        let (origin, result) = match self.config.continuation_policy {
            ContinuationPolicy::None => return,
            ContinuationPolicy::AutoChain => (
                PredictionOrigin::Continuation,
                self.admit(game, record.first_suit(), PredictionOrigin::Continuation),
            ),
            ContinuationPolicy::BackupOnLoss => {
                if resolved.status().is_win() {
                    return;
                }
                let anchor = match self.config.backup_anchor {
                    BackupAnchor::Target => resolved.target_game,
                    BackupAnchor::Observed => game,
                };
                let suit = self.config.suit_pairs.opposite(resolved.suit);
                (
                    PredictionOrigin::Backup,
                    self.admit(anchor, Some(suit), PredictionOrigin::Backup),
                )
            }
        };

        self.collect(observation, origin, result);
    }
}
