//! Prometheus metrics and structured logging for volspike.
//!
//! - Structured logging with tracing (pretty in development, JSON in production)
//! - Process-wide counters for poll cycles, alerts, fetch errors and sessions

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
