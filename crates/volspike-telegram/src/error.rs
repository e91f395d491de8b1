//! Telegram client error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The Bot API answered `ok: false`.
    #[error("Telegram API error {code:?}: {description}")]
    Api {
        code: Option<i32>,
        description: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

pub type TelegramResult<T> = Result<T, TelegramError>;
