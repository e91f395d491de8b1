//! Hourly volume samples and the ratio signal.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Ratio above which a sample is alertable. A ratio of exactly 5.0 is not.
pub const ALERT_RATIO_THRESHOLD: f64 = 5.0;

/// Two consecutive hourly volumes for one symbol and their ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeSample {
    /// Volume of the previous (closed) hour.
    pub prev_volume: f64,
    /// Volume of the current (open) hour.
    pub curr_volume: f64,
    /// `curr_volume / prev_volume`.
    pub ratio: f64,
}

impl VolumeSample {
    /// Build a sample from two volumes.
    ///
    /// Returns `None` when the previous volume is zero: the ratio is
    /// undefined and the symbol carries no signal this cycle.
    pub fn from_volumes(prev_volume: f64, curr_volume: f64) -> Option<Self> {
        if prev_volume == 0.0 {
            return None;
        }

        Some(Self {
            prev_volume,
            curr_volume,
            ratio: curr_volume / prev_volume,
        })
    }

    /// Whether this sample should raise an alert (strictly above threshold).
    pub fn exceeds_threshold(&self) -> bool {
        self.ratio > ALERT_RATIO_THRESHOLD
    }
}

/// Parse a string-encoded volume.
///
/// Malformed input yields `0.0`, which routes the sample through the
/// zero-previous-volume skip path instead of failing the request.
pub fn parse_volume(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        Ok(v) => {
            debug!(raw, value = v, "Non-finite volume, treating as zero");
            0.0
        }
        Err(e) => {
            debug!(raw, error = %e, "Unparseable volume, treating as zero");
            0.0
        }
    }
}
