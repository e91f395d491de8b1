//! HTTP client for the Telegram Bot API.
//!
//! The bot token is part of every request URL, so transport errors are
//! stripped of their URL before they reach logs.

use crate::error::{TelegramError, TelegramResult};
use crate::types::{ApiResponse, GetUpdatesRequest, SendMessageRequest, Update, User};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Default Bot API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Timeout for short calls (getMe, sendMessage).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Slack added on top of the long-poll timeout for getUpdates.
const LONG_POLL_SLACK: Duration = Duration::from_secs(15);

/// Client for the Telegram Bot API.
pub struct TelegramClient {
    client: Client,
    /// "{api_base}/bot{token}".
    method_base: String,
}

impl TelegramClient {
    /// Create a client for the bot identified by `token`.
    pub fn new(token: &str, api_base: &str) -> TelegramResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| TelegramError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            method_base: format!("{}/bot{}", api_base.trim_end_matches('/'), token),
        })
    }

    /// Verify the token and return the bot account.
    pub async fn get_me(&self) -> TelegramResult<User> {
        self.call("getMe", &serde_json::json!({}), None).await
    }

    /// Long-poll for updates with `update_id >= offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> TelegramResult<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: &["message"],
        };
        let timeout = Duration::from_secs(timeout_secs) + LONG_POLL_SLACK;
        self.call("getUpdates", &request, Some(timeout)).await
    }

    /// Send a plain-text message to `chat_id`.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> TelegramResult<()> {
        let request = SendMessageRequest { chat_id, text };
        let _: serde_json::Value = self.call("sendMessage", &request, None).await?;
        debug!(chat_id, "Message sent");
        Ok(())
    }

    async fn call<B, T>(
        &self,
        method: &str,
        body: &B,
        timeout: Option<Duration>,
    ) -> TelegramResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.method_base, method);
        let mut request = self.client.post(&url).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TelegramError::Http(format!("{method}: {}", e.without_url())))?;

        // Error statuses still carry the JSON envelope with a description.
        let text = response
            .text()
            .await
            .map_err(|e| TelegramError::Http(format!("{method}: {}", e.without_url())))?;

        parse_envelope(&text)
    }
}

fn parse_envelope<T: DeserializeOwned>(text: &str) -> TelegramResult<T> {
    let envelope: ApiResponse<T> = serde_json::from_str(text)?;
    if !envelope.ok {
        return Err(TelegramError::Api {
            code: envelope.error_code,
            description: envelope
                .description
                .unwrap_or_else(|| "unknown error".to_string()),
        });
    }

    envelope.result.ok_or_else(|| TelegramError::Api {
        code: None,
        description: "missing result".to_string(),
    })
}
