//! Kline (candlestick) decoding.
//!
//! The exchange returns klines as arrays of mixed values:
//! `[openTime, open, high, low, close, volume, closeTime, ...]` with prices
//! and volumes string-encoded.

use crate::error::{MarketError, MarketResult};
use serde_json::Value;
use tracing::debug;
use volspike_core::{parse_volume, Symbol, VolumeSample};

/// Position of the base-asset volume inside a kline row.
pub const KLINE_VOLUME_INDEX: usize = 5;

/// Extract the volume column of one kline row.
///
/// String values go through `parse_volume`; plain JSON numbers are accepted;
/// anything else (missing column, null, object) counts as zero.
fn row_volume(row: &[Value]) -> f64 {
    match row.get(KLINE_VOLUME_INDEX) {
        Some(Value::String(s)) => parse_volume(s),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        other => {
            debug!(value = ?other, "Kline volume column missing or non-numeric");
            0.0
        }
    }
}

/// Build a volume sample from the two most recent klines.
///
/// Returns `Ok(None)` when the previous volume is zero.
pub fn volume_sample_from_klines(
    symbol: &Symbol,
    klines: &[Vec<Value>],
) -> MarketResult<Option<VolumeSample>> {
    if klines.len() < 2 {
        return Err(MarketError::InsufficientData {
            symbol: symbol.to_string(),
            count: klines.len(),
        });
    }

    let prev_volume = row_volume(&klines[0]);
    let curr_volume = row_volume(&klines[1]);

    Ok(VolumeSample::from_volumes(prev_volume, curr_volume))
}
