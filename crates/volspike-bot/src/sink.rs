//! Alert sinks.
//!
//! A sink delivers a formatted text to a session's destination. The
//! monitoring loop and the command handler only see the trait, so the same
//! loop drives Telegram chats, the console, or a recording sink in tests.

use parking_lot::Mutex;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use volspike_core::SessionId;
use volspike_market::BoxFuture;
use volspike_telegram::TelegramClient;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SinkResult<T> = Result<T, SinkError>;

/// Destination for alerts and lifecycle notifications.
pub trait AlertSink: Send + Sync {
    /// Deliver `text` to the destination identified by `destination`.
    fn send(&self, destination: SessionId, text: String) -> BoxFuture<'_, SinkResult<()>>;
}

/// Sends messages to the Telegram chat whose id is the session id.
pub struct TelegramSink {
    client: Arc<TelegramClient>,
}

impl TelegramSink {
    pub fn new(client: Arc<TelegramClient>) -> Self {
        Self { client }
    }
}

impl AlertSink for TelegramSink {
    fn send(&self, destination: SessionId, text: String) -> BoxFuture<'_, SinkResult<()>> {
        Box::pin(async move {
            self.client
                .send_message(destination.value(), &text)
                .await
                .map_err(|e| SinkError::Delivery(e.to_string()))
        })
    }
}

/// Prints messages to stdout. The destination is ignored.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

impl AlertSink for ConsoleSink {
    fn send(&self, _destination: SessionId, text: String) -> BoxFuture<'_, SinkResult<()>> {
        let result = {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            writeln!(out, "{text}\n").and_then(|_| out.flush())
        };
        Box::pin(async move { result.map_err(SinkError::from) })
    }
}

/// Records every message; optionally fails deliveries. For tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<(SessionId, String)>>,
    fail: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent deliveries fail (messages are still recorded).
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<(SessionId, String)> {
        self.messages.lock().clone()
    }

    pub fn messages_for(&self, destination: SessionId) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter(|(id, _)| *id == destination)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

impl AlertSink for RecordingSink {
    fn send(&self, destination: SessionId, text: String) -> BoxFuture<'_, SinkResult<()>> {
        self.messages.lock().push((destination, text));
        let result = if self.fail.load(Ordering::SeqCst) {
            Err(SinkError::Delivery("recording sink set to fail".to_string()))
        } else {
            Ok(())
        };
        Box::pin(async move { result })
    }
}
