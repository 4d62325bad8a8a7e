use async_trait::async_trait;

use crate::domain::errors::SinkError;
use crate::domain::models::MessageHandle;

/// Port for posting and editing prediction notifications.
///
/// Implementations may fail; callers treat every failure as recoverable and
/// never roll back engine state because of it.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Post a new message and return a handle for later edits.
    async fn post(&self, text: &str) -> Result<MessageHandle, SinkError>;

    /// Replace the text of a previously posted message.
    async fn edit(&self, handle: MessageHandle, text: &str) -> Result<(), SinkError>;
}
