//! Market data source trait.
//!
//! Abstracts the two fetch operations so the monitoring loop can be driven
//! by the real HTTP client or by a scripted mock in tests.

use crate::client::MarketClient;
use crate::error::{MarketError, MarketResult};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use volspike_core::{Symbol, VolumeSample};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Source of ranked symbols and per-symbol volume signals.
pub trait MarketDataSource: Send + Sync {
    /// Top ranked symbols, in ranking order.
    fn fetch_top_symbols(&self) -> BoxFuture<'_, MarketResult<Vec<Symbol>>>;

    /// Volume signal for one symbol; `None` means "no signal".
    fn fetch_volume_signal<'a>(
        &'a self,
        symbol: &'a Symbol,
    ) -> BoxFuture<'a, MarketResult<Option<VolumeSample>>>;
}

impl MarketDataSource for MarketClient {
    fn fetch_top_symbols(&self) -> BoxFuture<'_, MarketResult<Vec<Symbol>>> {
        Box::pin(MarketClient::fetch_top_symbols(self))
    }

    fn fetch_volume_signal<'a>(
        &'a self,
        symbol: &'a Symbol,
    ) -> BoxFuture<'a, MarketResult<Option<VolumeSample>>> {
        Box::pin(MarketClient::fetch_volume_signal(self, symbol))
    }
}

/// Scripted per-symbol response for `MockMarketSource`.
#[derive(Debug, Clone)]
pub enum MockVolumeResponse {
    Sample(VolumeSample),
    NoSignal,
    InsufficientData,
    NetworkError,
}

/// Mock market source for testing.
///
/// Symbols without a scripted response answer `NoSignal`.
#[derive(Debug, Default)]
pub struct MockMarketSource {
    symbols: Mutex<Vec<Symbol>>,
    /// Errors returned by the next `fetch_top_symbols` calls, oldest first.
    symbol_failures: Mutex<VecDeque<String>>,
    volumes: Mutex<HashMap<Symbol, MockVolumeResponse>>,
    symbol_calls: AtomicUsize,
    volume_calls: Mutex<Vec<Symbol>>,
}

impl MockMarketSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ranking returned by `fetch_top_symbols`.
    pub fn with_symbols(self, symbols: Vec<Symbol>) -> Self {
        *self.symbols.lock() = symbols;
        self
    }

    /// Script the volume response for one symbol.
    pub fn with_volume(self, symbol: Symbol, response: MockVolumeResponse) -> Self {
        self.volumes.lock().insert(symbol, response);
        self
    }

    /// Make the next `fetch_top_symbols` call fail with a network error.
    pub fn fail_next_symbols(&self, message: impl Into<String>) {
        self.symbol_failures.lock().push_back(message.into());
    }

    /// Number of `fetch_top_symbols` calls so far.
    pub fn symbol_calls(&self) -> usize {
        self.symbol_calls.load(Ordering::SeqCst)
    }

    /// Symbols passed to `fetch_volume_signal`, in call order.
    pub fn volume_calls(&self) -> Vec<Symbol> {
        self.volume_calls.lock().clone()
    }
}

impl MarketDataSource for MockMarketSource {
    fn fetch_top_symbols(&self) -> BoxFuture<'_, MarketResult<Vec<Symbol>>> {
        self.symbol_calls.fetch_add(1, Ordering::SeqCst);
        let result = match self.symbol_failures.lock().pop_front() {
            Some(message) => Err(MarketError::Network(message)),
            None => Ok(self.symbols.lock().clone()),
        };
        Box::pin(async move { result })
    }

    fn fetch_volume_signal<'a>(
        &'a self,
        symbol: &'a Symbol,
    ) -> BoxFuture<'a, MarketResult<Option<VolumeSample>>> {
        self.volume_calls.lock().push(symbol.clone());
        let response = self
            .volumes
            .lock()
            .get(symbol)
            .cloned()
            .unwrap_or(MockVolumeResponse::NoSignal);

        let result = match response {
            MockVolumeResponse::Sample(sample) => Ok(Some(sample)),
            MockVolumeResponse::NoSignal => Ok(None),
            MockVolumeResponse::InsufficientData => Err(MarketError::InsufficientData {
                symbol: symbol.to_string(),
                count: 1,
            }),
            MockVolumeResponse::NetworkError => {
                Err(MarketError::Network(format!("mock failure for {symbol}")))
            }
        };
        Box::pin(async move { result })
    }
}
