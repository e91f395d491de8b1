//! Volume spike monitor - entry point.
//!
//! `telegram` (default): chat bot with per-chat monitoring sessions.
//! `console`: a single session printing alerts to stdout.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use volspike_bot::{config, AppConfig, Application};

/// Hourly volume spike monitor
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via VOLSPIKE_CONFIG env var)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Run the Telegram bot (default)
    Telegram,
    /// Print alerts for a single session to stdout
    Console,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config_path = AppConfig::resolve_path(args.config);
    let config = AppConfig::load_or_default(&config_path)?;

    volspike_telemetry::init_logging(config.telemetry.log_level.as_deref())?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        config_path = %config_path,
        "Starting volspike"
    );

    match args.mode.unwrap_or(Mode::Telegram) {
        Mode::Telegram => {
            let token = config::bot_token_from_env()?;
            let app = Application::connect(config, &token).await?;
            app.run().await?;
        }
        Mode::Console => volspike_bot::run_console(config).await?,
    }

    Ok(())
}
