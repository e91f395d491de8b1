//! HTTP client for the ranking and kline APIs.
//!
//! One shared `reqwest::Client` serves both upstreams. No retries happen
//! here; the monitoring loop decides what a failure means.

use crate::error::{MarketError, MarketResult};
use crate::kline::volume_sample_from_klines;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};
use volspike_core::{Symbol, VolumeSample};

/// Default ranking API base URL.
pub const DEFAULT_RANKING_URL: &str = "https://api.coingecko.com/api/v3";

/// Default exchange API base URL.
pub const DEFAULT_KLINE_URL: &str = "https://api.binance.com/api/v3";

/// Number of ranked assets requested per cycle.
const TOP_N: u32 = 100;

/// Kline interval used for the volume ratio.
const KLINE_INTERVAL: &str = "1h";

/// Base URLs of the two upstream APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketEndpoints {
    /// Ranking API base (e.g., "https://api.coingecko.com/api/v3").
    pub ranking_url: String,
    /// Exchange API base (e.g., "https://api.binance.com/api/v3").
    pub kline_url: String,
}

impl Default for MarketEndpoints {
    fn default() -> Self {
        Self {
            ranking_url: DEFAULT_RANKING_URL.to_string(),
            kline_url: DEFAULT_KLINE_URL.to_string(),
        }
    }
}

/// One record of the ranking response. Only the symbol is used.
#[derive(Debug, Deserialize)]
struct RankedAsset {
    #[serde(default)]
    symbol: String,
}

/// Client for the ranking and kline APIs.
pub struct MarketClient {
    client: Client,
    endpoints: MarketEndpoints,
}

impl MarketClient {
    /// Create a client without a request timeout.
    pub fn new(endpoints: MarketEndpoints) -> MarketResult<Self> {
        Self::with_timeout(endpoints, None)
    }

    /// Create a client, optionally bounding every request by `timeout`.
    pub fn with_timeout(
        endpoints: MarketEndpoints,
        timeout: Option<Duration>,
    ) -> MarketResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| MarketError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, endpoints })
    }

    /// Fetch the top ranked assets as exchange pair symbols.
    ///
    /// Upstream ranking order is preserved.
    pub async fn fetch_top_symbols(&self) -> MarketResult<Vec<Symbol>> {
        let url = format!(
            "{}/coins/markets",
            self.endpoints.ranking_url.trim_end_matches('/')
        );
        let per_page = TOP_N.to_string();
        debug!(url = %url, "Fetching market cap ranking");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("vs_currency", "usd"),
                ("order", "market_cap_desc"),
                ("per_page", per_page.as_str()),
                ("page", "1"),
                ("sparkline", "false"),
            ])
            .send()
            .await
            .map_err(|e| MarketError::Network(format!("Ranking request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MarketError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| MarketError::Network(format!("Failed to read ranking body: {e}")))?;

        let assets: Vec<RankedAsset> = serde_json::from_str(&body)
            .map_err(|e| MarketError::Decode(format!("Failed to parse ranking response: {e}")))?;

        let symbols: Vec<Symbol> = assets
            .iter()
            .filter_map(|asset| {
                let base = asset.symbol.trim();
                if base.is_empty() {
                    debug!("Skipping ranked asset with empty symbol");
                    None
                } else {
                    Some(Symbol::from_base_asset(base))
                }
            })
            .collect();

        info!(count = symbols.len(), "Fetched top symbols");
        Ok(symbols)
    }

    /// Fetch the two most recent hourly candles for `symbol` and compute the
    /// volume ratio.
    ///
    /// Returns `Ok(None)` when the exchange rejects the symbol (HTTP 400) or
    /// when the previous hour's volume is zero.
    pub async fn fetch_volume_signal(&self, symbol: &Symbol) -> MarketResult<Option<VolumeSample>> {
        let url = format!("{}/klines", self.endpoints.kline_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol.as_str()),
                ("interval", KLINE_INTERVAL),
                ("limit", "2"),
            ])
            .send()
            .await
            .map_err(|e| MarketError::Network(format!("Kline request for {symbol} failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST {
            // Ranked asset without a pair on the exchange.
            debug!(symbol = %symbol, "Symbol not listed on exchange, skipping");
            return Ok(None);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(symbol = %symbol, status = status.as_u16(), "Kline request rejected");
            return Err(MarketError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| MarketError::Network(format!("Failed to read kline body: {e}")))?;

        let klines: Vec<Vec<Value>> = serde_json::from_str(&body)
            .map_err(|e| MarketError::Decode(format!("Failed to parse klines for {symbol}: {e}")))?;

        volume_sample_from_klines(symbol, &klines)
    }
}
