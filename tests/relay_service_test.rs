//! Relay service behavior end to end with in-memory sinks.

mod common;

use baccarat_relay::domain::models::{Config, ContinuationPolicy, MessageHandle};
use baccarat_relay::infrastructure::memory_sink::SinkEntry;
use baccarat_relay::services::Disposition;
use common::{finalized, live, relay_with, setup_test_logging};

const PENDING: &str = "⏳ EN COURS";

#[tokio::test]
async fn test_prediction_posted_then_edited_on_win() {
    setup_test_logging();
    let (relay, sink, _admin) = relay_with(&Config::default());

    let report = relay.handle_source_message(&live(718, "K♥️9♣️")).await;
    assert_eq!(report.disposition, Disposition::Processed);
    assert_eq!(report.posted, 1);

    let posted = sink.posts();
    assert_eq!(posted.len(), 1);
    assert!(posted[0].text().contains("PRÉDICTION #720"));
    assert!(posted[0].text().contains("❤️ Cœur"));
    assert!(posted[0].text().contains(PENDING));

    let snapshot = relay.snapshot().await;
    assert_eq!(snapshot.active[0].handle, Some(MessageHandle::new(1)));

    let report = relay.handle_source_message(&finalized(720, "Q♦️5♥️A♥️")).await;
    assert_eq!(report.edited, 1);

    let text = sink.current_text(MessageHandle::new(1)).expect("posted");
    assert!(text.contains("✅0\u{FE0F}\u{20E3}"));
    assert!(!text.contains(PENDING));
    assert!(relay.snapshot().await.active.is_empty());
}

#[tokio::test]
async fn test_advanced_prediction_is_not_edited() {
    let (relay, sink, _admin) = relay_with(&Config::default());
    relay.handle_source_message(&live(718, "A♠")).await;

    let report = relay.handle_source_message(&finalized(720, "2♦")).await;

    let observation = report.observation.expect("processed");
    assert_eq!(observation.advanced.len(), 1);
    assert_eq!(report.edited, 0);
    assert!(sink.edits().is_empty());
}

#[tokio::test]
async fn test_lost_prediction_edit() {
    let (relay, sink, _admin) = relay_with(&Config::default());
    relay.handle_source_message(&live(718, "A♠")).await;

    for game in 720..=723 {
        relay.handle_source_message(&finalized(game, "2♦")).await;
    }

    let edits = sink.edits();
    assert_eq!(edits.len(), 1);
    assert!(edits[0].text().contains("❌"));
}

#[tokio::test]
async fn test_duplicates_and_repeated_finalization_are_dropped() {
    let (relay, sink, _admin) = relay_with(&Config::default());
    let text = live(718, "A♠");

    relay.handle_source_message(&text).await;
    let report = relay.handle_source_message(&text).await;
    assert_eq!(report.disposition, Disposition::Duplicate);
    assert_eq!(sink.posts().len(), 1);

    relay.handle_source_message(&finalized(719, "3♣")).await;
    let report = relay.handle_source_edit(&format!("{} 🔰", finalized(719, "3♣"))).await;
    assert_eq!(report.disposition, Disposition::AlreadyFinalized);
}

#[tokio::test]
async fn test_malformed_messages_change_nothing() {
    let (relay, sink, _admin) = relay_with(&Config::default());

    let report = relay.handle_source_message("#N12 no groups here").await;
    assert_eq!(report.disposition, Disposition::Malformed);
    assert_eq!(report.game, Some(12));
    assert!(report.error.is_some());

    assert!(sink.entries().is_empty());
    assert!(relay.snapshot().await.last_game.is_none());
}

#[tokio::test]
async fn test_out_of_range_game_numbers_are_malformed() {
    let (relay, sink, _admin) = relay_with(&Config::default());

    for text in ["#N18446744073709551615. 0(A♠) ⏳", "#N0. 3(A♠️) ✅"] {
        let report = relay.handle_source_message(text).await;
        assert_eq!(report.disposition, Disposition::Malformed);
        assert_eq!(report.game, None);
        assert!(report.error.expect("parse error").contains("out of range"));
    }

    assert!(sink.entries().is_empty());
    assert!(relay.snapshot().await.last_game.is_none());
}

#[tokio::test]
async fn test_finalized_marker_past_fingerprint_head_still_verifies() {
    let (relay, sink, _admin) = relay_with(&Config::default());
    relay.handle_source_message(&live(718, "K♥️9♣️")).await;

    let body = "#N720. 5(Q♦️5♥️A♥️) - 3(J♦️3♣️) - 4(10♠️2♣️) - 6(9♦️K♣️) - 8(8♠️)";
    assert!(body.chars().count() > 50);

    let report = relay.handle_source_message(&format!("{body} ⏰")).await;
    assert_eq!(report.disposition, Disposition::Processed);
    let report = relay.handle_source_message(&format!("{body} ✅")).await;
    assert_eq!(report.disposition, Disposition::Processed);
    assert_eq!(report.edited, 1);

    let text = sink.current_text(MessageHandle::new(1)).expect("posted");
    assert!(text.contains("✅0\u{FE0F}\u{20E3}"));
    assert!(relay.snapshot().await.active.is_empty());
}

#[tokio::test]
async fn test_finalized_messages_forwarded_to_admin() {
    let (relay, _sink, admin) = relay_with(&Config::default());

    relay.handle_source_message(&live(718, "A♠")).await;
    let report = relay.handle_source_message(&finalized(719, "3♣")).await;
    assert!(report.forwarded);

    let forwarded = admin.posts();
    assert_eq!(forwarded.len(), 1);
    assert!(forwarded[0].text().starts_with("📨 Message finalisé:\n\n#N719"));

    relay.handle_admin_command(0, "/stoptransfert").await;
    let report = relay.handle_source_message(&finalized(720, "3♣")).await;
    assert!(!report.forwarded);
    assert_eq!(admin.posts().len(), 1);
}

#[tokio::test]
async fn test_sink_failure_keeps_state_moving() {
    let (relay, sink, _admin) = relay_with(&Config::default());
    sink.set_failing(true);

    let report = relay.handle_source_message(&live(718, "A♠")).await;
    assert_eq!(report.sink_failures, 1);
    assert_eq!(relay.snapshot().await.active.len(), 1);

    sink.set_failing(false);
    let report = relay.handle_source_message(&finalized(720, "A♠")).await;
    let observation = report.observation.expect("processed");
    assert_eq!(observation.resolved.len(), 1);
    assert_eq!(report.edited, 0);
    assert!(sink.entries().is_empty());
}

#[tokio::test]
async fn test_auto_chain_posts_follow_up() {
    let mut config = Config::default();
    config.engine.continuation_policy = ContinuationPolicy::AutoChain;
    let (relay, sink, _admin) = relay_with(&config);

    relay.handle_source_message(&live(718, "A♠")).await;
    let report = relay.handle_source_message(&finalized(720, "♦2♠")).await;

    assert_eq!(report.posted, 1);
    assert_eq!(report.edited, 1);
    let entries = sink.entries();
    // The follow-up is posted before the resolved prediction is edited
    assert!(matches!(entries[1], SinkEntry::Post { handle: 2, .. }));
    assert!(matches!(entries[2], SinkEntry::Edit { handle: 1, .. }));
    assert!(entries[1].text().contains("#722"));
    assert!(entries[1].text().contains("Carreau"));
}

#[tokio::test]
async fn test_admin_commands_drive_engine() {
    let mut config = Config::default();
    config.telegram.admin_id = 99;
    let (relay, sink, _admin) = relay_with(&config);

    relay.handle_source_message(&live(718, "A♠")).await;

    let reply = relay.handle_admin_command(99, "/setoffset 5").await.expect("reply");
    assert!(reply.contains('5'));
    assert_eq!(relay.snapshot().await.offset, 5);

    let reply = relay.handle_admin_command(99, "/forceclear").await.expect("reply");
    assert!(reply.contains('1'));

    relay.handle_admin_command(99, "/predict").await.expect("reply");
    let posts = sink.posts();
    assert_eq!(posts.len(), 2);
    assert!(posts[1].text().contains("#723"));

    let status = relay.handle_admin_command(99, "/status").await.expect("reply");
    assert!(status.contains("723"));
}
