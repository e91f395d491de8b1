//! Application orchestration.
//!
//! Telegram mode wires the market client, session registry, supervisor and
//! command handler together and runs the update-polling loop until Ctrl-C.
//! Console mode runs a single unpersisted session that prints to stdout.

use crate::commands::CommandHandler;
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::sink::{AlertSink, ConsoleSink, TelegramSink};
use crate::supervisor::Supervisor;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use volspike_core::SessionId;
use volspike_market::MarketClient;
use volspike_store::{SessionRegistry, SessionStore};
use volspike_telegram::{BotCommand, TelegramClient, Update};
use volspike_telemetry::Metrics;

/// How long shutdown waits for each monitoring loop to exit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Telegram bot application.
pub struct Application {
    config: AppConfig,
    client: Arc<TelegramClient>,
    supervisor: Arc<Supervisor>,
    handler: CommandHandler,
    shutdown: CancellationToken,
}

impl Application {
    /// Build the application and authenticate with the bot API.
    pub async fn connect(config: AppConfig, token: &str) -> AppResult<Self> {
        config.validate()?;

        let client = Arc::new(TelegramClient::new(token, &config.telegram.api_base)?);
        let me = client
            .get_me()
            .await
            .map_err(|e| AppError::Auth(e.to_string()))?;
        info!(
            bot_id = me.id,
            username = me.username.as_deref().unwrap_or("-"),
            "Authorized on Telegram"
        );

        let source = Arc::new(MarketClient::with_timeout(
            config.market.endpoints(),
            config.market.request_timeout(),
        )?);
        let registry = Arc::new(SessionRegistry::new(SessionStore::new(
            &config.persistence.status_file,
        )));
        let sink: Arc<dyn AlertSink> = Arc::new(TelegramSink::new(client.clone()));
        let supervisor = Arc::new(Supervisor::new(
            source,
            sink,
            registry,
            config.monitor.timing(),
        ));
        let handler = CommandHandler::new(supervisor.clone());

        Ok(Self {
            config,
            client,
            supervisor,
            handler,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn supervisor(&self) -> &Arc<Supervisor> {
        &self.supervisor
    }

    /// Token that stops `run` when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Resume persisted sessions and poll for commands until shutdown.
    pub async fn run(self) -> AppResult<()> {
        let resumed = self.supervisor.resume();
        info!(resumed = resumed.len(), "Starting command loop");

        let signal_token = self.shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Shutdown signal received");
                    signal_token.cancel();
                }
                Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
            }
        });

        let poll_timeout = self.config.telegram.poll_timeout_secs;
        let poll_retry = Duration::from_secs(self.config.telegram.poll_retry_secs);
        let mut offset = 0i64;

        loop {
            let result = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                result = self.client.get_updates(offset, poll_timeout) => result,
            };

            match result {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        self.dispatch(update).await;
                    }
                }
                Err(e) => {
                    warn!(error = %e, retry_secs = poll_retry.as_secs(), "Failed to poll updates");
                    tokio::select! {
                        _ = self.shutdown.cancelled() => break,
                        _ = tokio::time::sleep(poll_retry) => {}
                    }
                }
            }
        }

        info!(
            active_sessions = Metrics::active_sessions(),
            "Shutting down"
        );
        self.supervisor.shutdown(SHUTDOWN_GRACE).await;
        log_final_metrics();
        Ok(())
    }

    async fn dispatch(&self, update: Update) {
        let Some(message) = update.message else {
            return;
        };
        if !message.is_command() {
            return;
        }
        let session = message.session_id();
        let text = message.text.as_deref().unwrap_or_default();
        let Some(command) = BotCommand::parse(text) else {
            debug!(session = %session, "Ignoring unknown command");
            return;
        };

        if let Some(reply) = self.handler.handle(session, command) {
            if let Err(e) = self.supervisor.sink().send(session, reply).await {
                Metrics::delivery_error();
                error!(session = %session, error = %e, "Error sending message");
            }
        }
    }
}

/// Run one console session until Ctrl-C.
pub async fn run_console(config: AppConfig) -> AppResult<()> {
    config.validate()?;

    let source = Arc::new(MarketClient::with_timeout(
        config.market.endpoints(),
        config.market.request_timeout(),
    )?);
    let supervisor = Supervisor::new(
        source,
        Arc::new(ConsoleSink::new()),
        Arc::new(SessionRegistry::in_memory()),
        config.monitor.timing(),
    );

    supervisor.start(SessionId::CONSOLE);
    info!("Console monitoring running, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    supervisor.shutdown(SHUTDOWN_GRACE).await;
    log_final_metrics();
    Ok(())
}

fn log_final_metrics() {
    match Metrics::render() {
        Ok(text) => debug!(metrics = %text, "Final metrics"),
        Err(e) => warn!(error = %e, "Failed to render metrics"),
    }
}
