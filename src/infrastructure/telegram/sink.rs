use async_trait::async_trait;
use std::sync::Arc;

use super::client::TelegramClient;
use crate::domain::errors::SinkError;
use crate::domain::models::MessageHandle;
use crate::domain::ports::NotificationSink;

/// Notification sink posting into one Telegram chat
#[derive(Debug, Clone)]
pub struct TelegramSink {
    client: Arc<TelegramClient>,
    chat_id: i64,
}

impl TelegramSink {
    pub fn new(client: Arc<TelegramClient>, chat_id: i64) -> Self {
        Self { client, chat_id }
    }

    pub fn chat_id(&self) -> i64 {
        self.chat_id
    }
}

#[async_trait]
impl NotificationSink for TelegramSink {
    async fn post(&self, text: &str) -> Result<MessageHandle, SinkError> {
        let message = self.client.send_message(self.chat_id, text).await?;
        Ok(MessageHandle::new(message.message_id))
    }

    async fn edit(&self, handle: MessageHandle, text: &str) -> Result<(), SinkError> {
        self.client
            .edit_message_text(self.chat_id, handle.raw(), text)
            .await?;
        Ok(())
    }
}
