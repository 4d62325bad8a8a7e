//! Baccarat Relay - prediction relay for Telegram game channels
//!
//! The relay watches a source channel that publishes baccarat game results,
//! forecasts the first-card suit of a game a fixed offset ahead, posts the
//! forecast to a prediction channel and edits it as later results confirm
//! or refute it within a bounded catch-up window.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and the notification port
//! - **Service Layer** (`services`): parsing, the prediction engine, dedup and the relay
//! - **Infrastructure Layer** (`infrastructure`): config, logging, Telegram transport
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use baccarat_relay::{Config, RelayService};
//! use baccarat_relay::infrastructure::memory_sink::InMemorySink;
//!
//! let relay = RelayService::new(&Config::default(), Arc::new(InMemorySink::new()));
//! let report = relay.handle_source_message("#N720. 5(K♠️9♥️) - 3(J♦️3♣️)").await;
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    Config, ContinuationPolicy, EngineConfig, GameRecord, LoggingConfig, Prediction,
    PredictionOrigin, PredictionStatus, Suit,
};
pub use domain::ports::NotificationSink;
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{PredictionEngine, RelayService};
