//! Volume spike monitor.
//!
//! Polls the market ranking, checks each symbol's hourly volume ratio and
//! alerts when it exceeds 5x:
//! - `monitor`: per-session polling loop with cooperative cancellation
//! - `supervisor`: start/stop/resume lifecycle of session loops
//! - `commands`: chat command handling
//! - `sink`: alert delivery (Telegram, console)
//! - `app`: Telegram bot and console entry points

pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod messages;
pub mod monitor;
pub mod sink;
pub mod supervisor;

pub use app::{run_console, Application};
pub use commands::CommandHandler;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use monitor::{CycleOutcome, CycleStats, MonitorLoop, MonitorTiming};
pub use sink::{AlertSink, ConsoleSink, RecordingSink, SinkError, SinkResult, TelegramSink};
pub use supervisor::{StartOutcome, StopOutcome, Supervisor};
