//! Alert events raised when a volume ratio crosses the threshold.

use crate::sample::VolumeSample;
use crate::symbol::Symbol;
use chrono::{DateTime, Local};

/// Timestamp format used in alert messages.
pub const ALERT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An alertable sample for one symbol.
///
/// Constructed only for samples above the threshold and consumed
/// immediately by the alert sink.
#[derive(Debug, Clone)]
pub struct AlertEvent {
    pub symbol: Symbol,
    pub sample: VolumeSample,
    pub timestamp: DateTime<Local>,
}

impl AlertEvent {
    /// Create an alert stamped with the current local time.
    pub fn new(symbol: Symbol, sample: VolumeSample) -> Self {
        Self::with_timestamp(symbol, sample, Local::now())
    }

    pub fn with_timestamp(
        symbol: Symbol,
        sample: VolumeSample,
        timestamp: DateTime<Local>,
    ) -> Self {
        Self {
            symbol,
            sample,
            timestamp,
        }
    }

    /// Create an alert only if the sample exceeds the threshold.
    pub fn try_from_sample(symbol: Symbol, sample: VolumeSample) -> Option<Self> {
        sample
            .exceeds_threshold()
            .then(|| Self::new(symbol, sample))
    }

    /// Render the message delivered to the sink.
    pub fn format_message(&self) -> String {
        format!(
            "⚠️ Volume Alert for {}\n\
             Previous Hour Volume: {:.2}\n\
             Current Hour Volume: {:.2}\n\
             Volume Ratio: {:.2}x\n\
             Time: {}",
            self.symbol,
            self.sample.prev_volume,
            self.sample.curr_volume,
            self.sample.ratio,
            self.timestamp.format(ALERT_TIME_FORMAT)
        )
    }
}
