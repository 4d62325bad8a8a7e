/// Request and response types for the Telegram Bot API
use serde::{Deserialize, Serialize};

/// Envelope every Bot API method responds with
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,

    pub result: Option<T>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub error_code: Option<i64>,

    #[serde(default)]
    pub parameters: Option<ResponseParameters>,
}

/// Extra information attached to some errors
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseParameters {
    /// Seconds to wait before retrying after a flood-control error
    #[serde(default)]
    pub retry_after: Option<u64>,
}

/// One incoming update from getUpdates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_message: Option<Message>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_post: Option<Message>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_channel_post: Option<Message>,
}

/// A chat message or channel post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,

    pub chat: Chat,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Caption of media posts, used when there is no text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl Message {
    /// Text body, falling back to the media caption
    pub fn body(&self) -> Option<&str> {
        self.text.as_deref().or(self.caption.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,

    /// private, group, supergroup or channel
    #[serde(rename = "type")]
    pub kind: String,
}

impl Chat {
    pub fn is_private(&self) -> bool {
        self.kind == "private"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    #[serde(default)]
    pub is_bot: bool,
}

/// Body of sendMessage
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest<'a> {
    pub chat_id: i64,
    pub text: &'a str,
}

/// Body of editMessageText
#[derive(Debug, Clone, Serialize)]
pub struct EditMessageTextRequest<'a> {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: &'a str,
}

/// Body of getUpdates
#[derive(Debug, Clone, Serialize)]
pub struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    pub timeout: u64,
    pub allowed_updates: Vec<&'static str>,
}

/// Update kinds the relay subscribes to
pub const ALLOWED_UPDATES: [&str; 3] = ["message", "channel_post", "edited_channel_post"];
