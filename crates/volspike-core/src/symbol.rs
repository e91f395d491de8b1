//! Tradable pair symbols.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Quote asset appended to every ranked base asset.
pub const QUOTE_ASSET: &str = "USDT";

/// Exchange pair symbol, e.g. "BTCUSDT".
///
/// Recomputed every poll cycle from the ranking list; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Build the pair symbol for a ranked base asset ("btc" -> "BTCUSDT").
    pub fn from_base_asset(base: &str) -> Self {
        Self(format!("{}{}", base.to_uppercase(), QUOTE_ASSET))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
