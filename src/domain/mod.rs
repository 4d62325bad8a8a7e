//! Domain layer for the prediction relay
//!
//! This module contains core models, errors and the ports the services
//! depend on.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{EngineError, ParseError, RejectReason, SinkError};
