//! Infrastructure layer module
//!
//! This module contains the adapters and external integrations:
//! - Configuration management
//! - Logging infrastructure
//! - Telegram Bot API transport
//! - In-memory notification sink
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod config;
pub mod logging;
pub mod memory_sink;
pub mod telegram;
