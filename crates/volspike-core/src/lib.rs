//! Core domain types for the volspike volume monitor.
//!
//! This crate provides the types shared by every other crate:
//! - `SessionId`, `MonitorState`: identity and on/off state of a monitoring session
//! - `Symbol`: tradable pair derived from a ranked base asset (e.g. "BTCUSDT")
//! - `VolumeSample`: previous/current hourly volume and their ratio
//! - `AlertEvent`: a sample that crossed the alert threshold, ready for delivery

pub mod alert;
pub mod sample;
pub mod session;
pub mod symbol;

pub use alert::{AlertEvent, ALERT_TIME_FORMAT};
pub use sample::{parse_volume, VolumeSample, ALERT_RATIO_THRESHOLD};
pub use session::{MonitorState, SessionId};
pub use symbol::{Symbol, QUOTE_ASSET};
