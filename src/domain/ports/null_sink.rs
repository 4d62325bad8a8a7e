//! Null notification sink.
//!
//! Used when no outbound channel is configured but the relay still needs a
//! NotificationSink.

use async_trait::async_trait;

use super::NotificationSink;
use crate::domain::errors::SinkError;
use crate::domain::models::MessageHandle;

/// A sink that accepts nothing.
///
/// Every post fails with [`SinkError::Unavailable`], so predictions are
/// tracked without a handle and edits are skipped.
#[derive(Debug, Clone, Default)]
pub struct NullNotificationSink;

impl NullNotificationSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationSink for NullNotificationSink {
    async fn post(&self, _text: &str) -> Result<MessageHandle, SinkError> {
        Err(SinkError::Unavailable)
    }

    async fn edit(&self, _handle: MessageHandle, _text: &str) -> Result<(), SinkError> {
        Err(SinkError::Unavailable)
    }
}
