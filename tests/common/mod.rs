//! Common test utilities for integration tests
//!
//! Shared fixtures for building source messages and relays backed by the
//! in-memory sink.

use std::sync::Arc;

use baccarat_relay::domain::models::Config;
use baccarat_relay::infrastructure::memory_sink::InMemorySink;
use baccarat_relay::RelayService;

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A non-finalized source message whose first group is `first`.
#[allow(dead_code)]
pub fn live(game: u64, first: &str) -> String {
    format!("#N{game}. 5({first}) - 3(J♦️3♣️)")
}

/// A finalized source message whose first group is `first`.
#[allow(dead_code)]
pub fn finalized(game: u64, first: &str) -> String {
    format!("#N{game}. ✅5({first}) - 3(J♦️3♣️)")
}

/// Relay over a fresh in-memory sink, with a second sink for admin forwards.
#[allow(dead_code)]
pub fn relay_with(config: &Config) -> (RelayService, Arc<InMemorySink>, Arc<InMemorySink>) {
    let sink = Arc::new(InMemorySink::new());
    let admin = Arc::new(InMemorySink::new());
    let relay = RelayService::new(config, sink.clone()).with_admin_sink(admin.clone());
    (relay, sink, admin)
}
