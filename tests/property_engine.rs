use baccarat_relay::domain::models::{
    extract_first_suit, normalize_suits, BackupAnchor, ContinuationPolicy, CreationTrigger,
    EngineConfig, GameRecord, Prediction, PredictionOrigin, PredictionStatus, Suit,
};
use baccarat_relay::PredictionEngine;
use proptest::prelude::*;

fn suit_strategy() -> impl Strategy<Value = Suit> {
    prop::sample::select(Suit::ALL.to_vec())
}

/// Card groups built from suit glyphs in every encoding plus ranks and noise.
fn group_strategy() -> impl Strategy<Value = String> {
    let token = prop::sample::select(vec![
        "♠", "♠️", "♥", "♥️", "❤", "❤️", "♦", "♦️", "♣", "♣️", "A", "K", "10", "7", " ", "\u{FE0F}",
        "\u{FE0E}",
    ]);
    prop::collection::vec(token, 0..8).prop_map(|parts| parts.concat())
}

proptest! {
    /// Property: pending predictions never exceed max_concurrent
    #[test]
    fn prop_at_most_n_pending(
        max in 1usize..4,
        records in prop::collection::vec((0u64..6, group_strategy(), any::<bool>()), 1..60)
    ) {
        let config = EngineConfig {
            max_concurrent: max,
            creation_trigger: CreationTrigger::EveryRecord,
            ..EngineConfig::default()
        };
        let mut engine = PredictionEngine::new(config);
        let mut game = 100;

        for (step, group, finalized) in records {
            game += step;
            engine.observe(&GameRecord::single(game, group, finalized));
            prop_assert!(engine.pending_count() <= max);
        }
    }

    /// Property: stage grows by exactly one per miss, and resolution happens
    /// within four checks, winning at the earliest matching stage
    #[test]
    fn prop_stage_monotonic_and_bounded(
        suit in suit_strategy(),
        groups in prop::collection::vec(group_strategy(), 4)
    ) {
        let mut prediction = Prediction::new(720, suit, 718, PredictionOrigin::Observed);
        let first_hit = groups.iter().position(|g| normalize_suits(g).contains(suit.glyph()));

        let mut checks = 0;
        for (i, group) in groups.iter().enumerate() {
            if !prediction.is_pending() {
                break;
            }
            let before = prediction.stage();
            prediction.check(720 + i as u64, group, 3);
            checks += 1;
            if prediction.is_pending() {
                prop_assert_eq!(prediction.stage(), before + 1);
            }
        }

        match first_hit {
            Some(k) => {
                prop_assert_eq!(prediction.status(), PredictionStatus::WonAtStage(k as u8));
                prop_assert_eq!(checks, k + 1);
            }
            None => {
                prop_assert_eq!(prediction.status(), PredictionStatus::Lost);
                prop_assert_eq!(checks, 4);
            }
        }
    }

    /// Property: a terminal prediction ignores further checks
    #[test]
    fn prop_terminal_is_immutable(
        suit in suit_strategy(),
        groups in prop::collection::vec(group_strategy(), 4..10)
    ) {
        let mut prediction = Prediction::new(720, suit, 718, PredictionOrigin::Observed);
        let mut terminal = None;

        for (i, group) in groups.iter().enumerate() {
            prediction.check(720 + i as u64, group, 3);
            match terminal {
                Some(status) => prop_assert_eq!(prediction.status(), status),
                None if prediction.status().is_terminal() => terminal = Some(prediction.status()),
                None => {}
            }
        }
        prop_assert!(terminal.is_some());
    }

    /// Property: a resolved prediction leaves the active set and is never checked again
    #[test]
    fn prop_resolved_predictions_leave_engine(
        groups in prop::collection::vec(group_strategy(), 1..12)
    ) {
        let mut engine = PredictionEngine::new(EngineConfig::default());
        engine.observe(&GameRecord::single(718, "A♥", false));

        let mut resolved = 0;
        for (i, group) in groups.into_iter().enumerate() {
            let obs = engine.observe(&GameRecord::single(720 + i as u64, group, true));
            resolved += obs.resolved.len();
            if resolved > 0 {
                prop_assert!(engine.get(720).is_none());
            }
        }
        prop_assert!(resolved <= 1);
    }

    /// Property: with consecutive finalized records, every pending prediction
    /// still expects a future game, whatever the continuation policy
    #[test]
    fn prop_pending_predictions_expect_future_games(
        policy in prop_oneof![
            Just(ContinuationPolicy::None),
            Just(ContinuationPolicy::AutoChain),
            Just(ContinuationPolicy::BackupOnLoss),
        ],
        anchor in prop_oneof![Just(BackupAnchor::Target), Just(BackupAnchor::Observed)],
        groups in prop::collection::vec(group_strategy(), 1..40)
    ) {
        let config = EngineConfig {
            continuation_policy: policy,
            backup_anchor: anchor,
            max_concurrent: 3,
            ..EngineConfig::default()
        };
        let mut engine = PredictionEngine::new(config);
        engine.observe(&GameRecord::single(718, "A♥", false));

        for (i, group) in groups.into_iter().enumerate() {
            let game = 719 + i as u64;
            engine.observe(&GameRecord::single(game, group, true));
            for prediction in engine.active() {
                prop_assert!(prediction.expected_game().is_some_and(|next| next > game));
            }
        }
    }

    /// Property: extraction is stable under repeated normalization
    #[test]
    fn prop_extraction_idempotent(s in "\\PC{0,24}", group in group_strategy()) {
        for input in [s, group] {
            let once = normalize_suits(&input);
            let twice = normalize_suits(&once);
            prop_assert_eq!(&once, &twice);
            prop_assert_eq!(extract_first_suit(&once), extract_first_suit(&twice));
            prop_assert_eq!(extract_first_suit(&input), extract_first_suit(&once));
        }
    }
}
