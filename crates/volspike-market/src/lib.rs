//! Market data clients for volspike.
//!
//! Two read-only upstream APIs feed the monitor:
//! - the ranking API (top assets by market cap) -> `Symbol` list
//! - the exchange kline API (hourly candles) -> `VolumeSample`
//!
//! `MarketDataSource` abstracts both so the monitoring loop can run against
//! `MockMarketSource` in tests.

pub mod client;
pub mod error;
pub mod kline;
pub mod source;

pub use client::{MarketClient, MarketEndpoints};
pub use error::{MarketError, MarketResult};
pub use kline::{volume_sample_from_klines, KLINE_VOLUME_INDEX};
pub use source::{BoxFuture, MarketDataSource, MockMarketSource, MockVolumeResponse};
