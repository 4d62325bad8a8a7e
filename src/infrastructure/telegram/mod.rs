//! Telegram Bot API transport
//!
//! Thin adapter between the Bot API and the relay service:
//! - HTTP client for sendMessage, editMessageText and getUpdates
//! - NotificationSink implementation for one chat
//! - Long-polling update loop

pub mod client;
pub mod errors;
pub mod poller;
pub mod sink;
pub mod types;

pub use client::TelegramClient;
pub use errors::TelegramApiError;
pub use poller::{classify, InboundEvent, UpdatePoller};
pub use sink::TelegramSink;
