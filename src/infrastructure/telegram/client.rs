/// Telegram Bot API client
use anyhow::{Context, Result};
use reqwest::Client as ReqwestClient;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

use super::errors::TelegramApiError;
use super::types::{
    ApiResponse, EditMessageTextRequest, GetUpdatesRequest, Message, SendMessageRequest, Update,
    ALLOWED_UPDATES,
};
use crate::domain::models::TelegramConfig;
use crate::infrastructure::logging::SecretScrubber;

/// HTTP client for the handful of Bot API methods the relay needs
///
/// Features:
/// - Connection pooling and reuse (via reqwest::Client)
/// - Request timeout longer than the long-poll timeout
/// - Bot token scrubbed from every transport error
pub struct TelegramClient {
    /// Reusable HTTP client with connection pooling
    http_client: ReqwestClient,

    /// `{api_base_url}/bot{token}`
    bot_url: String,

    scrubber: SecretScrubber,
}

impl TelegramClient {
    /// Create a client from the Telegram section of the config
    ///
    /// # Errors
    /// Fails when the HTTP client cannot be built
    pub fn with_config(config: &TelegramConfig) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            bot_url: format!(
                "{}/bot{}",
                config.api_base_url.trim_end_matches('/'),
                config.bot_token
            ),
            scrubber: SecretScrubber::new(),
        })
    }

    /// Post a text message to a chat
    #[instrument(skip(self, text))]
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<Message, TelegramApiError> {
        self.call("sendMessage", &SendMessageRequest { chat_id, text })
            .await
    }

    /// Replace the text of a message the bot posted
    ///
    /// An edit that leaves the text unchanged counts as success.
    #[instrument(skip(self, text))]
    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> Result<(), TelegramApiError> {
        let request = EditMessageTextRequest {
            chat_id,
            message_id,
            text,
        };
        match self
            .call::<_, serde_json::Value>("editMessageText", &request)
            .await
        {
            Ok(_) => Ok(()),
            Err(err) if err.is_not_modified() => {
                debug!(chat_id, message_id, "Edit left message unchanged");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramApiError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: ALLOWED_UPDATES.to_vec(),
        };
        self.call("getUpdates", &request).await
    }

    /// Send a request and unwrap the Bot API envelope
    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, TelegramApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .http_client
            .post(format!("{}/{method}", self.bot_url))
            .json(body)
            .send()
            .await
            .map_err(|e| self.network_error(&e))?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| self.network_error(&e))?;

        let envelope: ApiResponse<T> = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                let body = String::from_utf8_lossy(&bytes).into_owned();
                return Err(TelegramApiError::Http(status, body));
            }
            Err(err) => return Err(err.into()),
        };

        if !envelope.ok {
            if let Some(retry_after) = envelope.parameters.as_ref().and_then(|p| p.retry_after) {
                return Err(TelegramApiError::RateLimited { retry_after });
            }
            return Err(TelegramApiError::Api {
                code: envelope
                    .error_code
                    .unwrap_or_else(|| i64::from(status.as_u16())),
                description: envelope.description.unwrap_or_default(),
            });
        }

        envelope.result.ok_or(TelegramApiError::MissingResult)
    }

    fn network_error(&self, err: &reqwest::Error) -> TelegramApiError {
        TelegramApiError::Network(self.scrubber.scrub_message(&err.to_string()))
    }
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient").finish_non_exhaustive()
    }
}
