//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing credential: {0} is not set")]
    MissingCredential(&'static str),

    #[error("Chat platform authentication failed: {0}")]
    Auth(String),

    #[error("Market client error: {0}")]
    Market(#[from] volspike_market::MarketError),

    #[error("Telegram error: {0}")]
    Telegram(#[from] volspike_telegram::TelegramError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] volspike_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
