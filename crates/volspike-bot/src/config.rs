//! Application configuration.
//!
//! Non-secret settings come from a TOML file; every section and key is
//! optional. The bot token comes only from the environment.

use crate::error::{AppError, AppResult};
use crate::monitor::MonitorTiming;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;
use volspike_market::MarketEndpoints;

/// Environment variable holding the Telegram bot token.
pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Environment variable overriding the config file path.
pub const CONFIG_PATH_ENV: &str = "VOLSPIKE_CONFIG";

/// Config file used when neither CLI nor environment name one.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Upstream API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    #[serde(default = "default_ranking_url")]
    pub ranking_url: String,
    #[serde(default = "default_kline_url")]
    pub kline_url: String,
    /// Per-request timeout in seconds. Unset means no timeout.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_ranking_url() -> String {
    volspike_market::client::DEFAULT_RANKING_URL.to_string()
}

fn default_kline_url() -> String {
    volspike_market::client::DEFAULT_KLINE_URL.to_string()
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            ranking_url: default_ranking_url(),
            kline_url: default_kline_url(),
            request_timeout_secs: None,
        }
    }
}

impl MarketConfig {
    pub fn endpoints(&self) -> MarketEndpoints {
        MarketEndpoints {
            ranking_url: self.ranking_url.clone(),
            kline_url: self.kline_url.clone(),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Poll loop timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Pause between full poll cycles (seconds). Default: 300.
    #[serde(default = "default_cycle_interval_secs")]
    pub cycle_interval_secs: u64,
    /// Pause between per-symbol kline requests (ms). Default: 100.
    #[serde(default = "default_symbol_delay_ms")]
    pub symbol_delay_ms: u64,
    /// Backoff after a failed ranking fetch (seconds). Default: 300.
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,
}

fn default_cycle_interval_secs() -> u64 {
    300
}

fn default_symbol_delay_ms() -> u64 {
    100
}

fn default_retry_backoff_secs() -> u64 {
    300
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            cycle_interval_secs: default_cycle_interval_secs(),
            symbol_delay_ms: default_symbol_delay_ms(),
            retry_backoff_secs: default_retry_backoff_secs(),
        }
    }
}

impl MonitorConfig {
    pub fn timing(&self) -> MonitorTiming {
        MonitorTiming {
            cycle_interval: Duration::from_secs(self.cycle_interval_secs),
            symbol_delay: Duration::from_millis(self.symbol_delay_ms),
            retry_backoff: Duration::from_secs(self.retry_backoff_secs),
        }
    }
}

/// Session state persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Path of the session status document.
    #[serde(default = "default_status_file")]
    pub status_file: String,
}

fn default_status_file() -> String {
    volspike_store::DEFAULT_STATUS_FILE.to_string()
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            status_file: default_status_file(),
        }
    }
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Long-poll timeout for getUpdates (seconds). Default: 60.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
    /// Pause after a failed getUpdates call (seconds). Default: 3.
    #[serde(default = "default_poll_retry_secs")]
    pub poll_retry_secs: u64,
}

fn default_api_base() -> String {
    volspike_telegram::DEFAULT_API_BASE.to_string()
}

fn default_poll_timeout_secs() -> u64 {
    60
}

fn default_poll_retry_secs() -> u64 {
    3
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            poll_timeout_secs: default_poll_timeout_secs(),
            poll_retry_secs: default_poll_retry_secs(),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter used when RUST_LOG is unset (e.g., "info,volspike=debug").
    #[serde(default)]
    pub log_level: Option<String>,
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config file {path}: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &str) -> AppResult<Self> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            info!(path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Resolve the config path: CLI arg > VOLSPIKE_CONFIG > default.
    pub fn resolve_path(cli_path: Option<String>) -> String {
        cli_path
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> AppResult<()> {
        if self.market.ranking_url.trim().is_empty() || self.market.kline_url.trim().is_empty() {
            return Err(AppError::Config("market URLs must not be empty".to_string()));
        }
        if self.persistence.status_file.trim().is_empty() {
            return Err(AppError::Config(
                "persistence.status_file must not be empty".to_string(),
            ));
        }
        if self.telegram.poll_timeout_secs == 0 {
            return Err(AppError::Config(
                "telegram.poll_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Read the bot token from the environment.
pub fn bot_token_from_env() -> AppResult<String> {
    match std::env::var(BOT_TOKEN_ENV) {
        Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(AppError::MissingCredential(BOT_TOKEN_ENV)),
    }
}
