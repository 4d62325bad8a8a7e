use reqwest::StatusCode;
use thiserror::Error;

use crate::domain::errors::SinkError;

/// Errors that can occur when calling the Telegram Bot API
#[derive(Error, Debug)]
pub enum TelegramApiError {
    /// The API answered `ok: false`
    #[error("Bot API error ({code}): {description}")]
    Api { code: i64, description: String },

    /// Flood control; retry after the given number of seconds
    #[error("Rate limited, retry after {retry_after}s")]
    RateLimited { retry_after: u64 },

    /// Non-JSON response with an error status (proxies, gateways)
    #[error("HTTP error ({0}): {1}")]
    Http(StatusCode, String),

    /// Network or connection error, already scrubbed of the bot token
    #[error("Network error: {0}")]
    Network(String),

    /// Response body could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `ok: true` without a result
    #[error("Bot API response has no result")]
    MissingResult,
}

impl TelegramApiError {
    /// Returns true if this error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Network(_) => true,
            Self::Http(status, _) => status.is_server_error(),
            Self::Api { code, .. } => *code >= 500,
            Self::Json(_) | Self::MissingResult => false,
        }
    }

    /// Edits that change nothing are reported as errors by the API
    pub fn is_not_modified(&self) -> bool {
        matches!(self, Self::Api { description, .. } if description.contains("message is not modified"))
    }
}

impl From<TelegramApiError> for SinkError {
    fn from(err: TelegramApiError) -> Self {
        match err {
            TelegramApiError::Api { description, .. } => Self::Rejected(description),
            other => Self::Transport(other.to_string()),
        }
    }
}
