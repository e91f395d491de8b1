//! Market data error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketError {
    /// Transport-level failure reaching an upstream API.
    #[error("Network error: {0}")]
    Network(String),

    /// Malformed or unexpected response body.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Upstream answered with a non-success status we do not special-case.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Fewer than two candles available for the ratio.
    #[error("Insufficient kline data for {symbol}: got {count} candle(s)")]
    InsufficientData { symbol: String, count: usize },

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

impl MarketError {
    /// Whether this failure happened before any response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

pub type MarketResult<T> = Result<T, MarketError>;
