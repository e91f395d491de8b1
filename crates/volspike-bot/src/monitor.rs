//! Per-session monitoring loop.
//!
//! Each running session owns one loop task:
//!
//! ```text
//! started notice -> [checkpoint -> ranking -> for each symbol:
//!                      checkpoint -> kline -> alert? -> symbol delay]
//!                   -> cycle pause -> repeat
//! ```
//!
//! Cancellation is cooperative. The loop polls the session flag and its
//! cancellation token at each checkpoint; sleeps also wake on the token.
//! In-flight HTTP requests are never aborted, so the worst-case stop
//! latency is one upstream request.

use crate::messages;
use crate::sink::AlertSink;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use volspike_core::{AlertEvent, SessionId};
use volspike_market::MarketDataSource;
use volspike_store::SessionRegistry;
use volspike_telemetry::Metrics;

/// Poll loop timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorTiming {
    /// Pause after a completed cycle.
    pub cycle_interval: Duration,
    /// Pause after each per-symbol request.
    pub symbol_delay: Duration,
    /// Pause after a failed ranking fetch.
    pub retry_backoff: Duration,
}

impl Default for MonitorTiming {
    fn default() -> Self {
        Self {
            cycle_interval: Duration::from_secs(300),
            symbol_delay: Duration::from_millis(100),
            retry_backoff: Duration::from_secs(300),
        }
    }
}

/// Counters for one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Symbols in the ranking.
    pub symbols: usize,
    /// Kline requests made.
    pub checked: usize,
    /// Requests that returned no signal (unlisted pair, zero volume).
    pub no_signal: usize,
    /// Alerts emitted.
    pub alerts: usize,
    /// Per-symbol fetch errors.
    pub errors: usize,
}

/// Result of one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Every symbol was checked.
    Completed(CycleStats),
    /// The ranking fetch failed; nothing was checked.
    RankingFailed,
    /// A stop was observed mid-cycle.
    Interrupted(CycleStats),
}

/// Monitoring loop for one session.
pub struct MonitorLoop {
    session: SessionId,
    source: Arc<dyn MarketDataSource>,
    sink: Arc<dyn AlertSink>,
    registry: Arc<SessionRegistry>,
    timing: MonitorTiming,
    cancel: CancellationToken,
}

impl MonitorLoop {
    pub fn new(
        session: SessionId,
        source: Arc<dyn MarketDataSource>,
        sink: Arc<dyn AlertSink>,
        registry: Arc<SessionRegistry>,
        timing: MonitorTiming,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            session,
            source,
            sink,
            registry,
            timing,
            cancel,
        }
    }

    /// Run until the session is stopped. Returns the number of completed cycles.
    pub async fn run(self) -> u64 {
        Metrics::session_started();
        info!(session = %self.session, "Monitoring loop started");
        self.deliver(messages::STARTED.to_string()).await;

        let mut cycles = 0u64;
        loop {
            if self.should_stop() {
                break;
            }

            match self.run_cycle().await {
                CycleOutcome::Completed(stats) => {
                    cycles += 1;
                    Metrics::cycle_completed();
                    info!(
                        session = %self.session,
                        symbols = stats.symbols,
                        checked = stats.checked,
                        alerts = stats.alerts,
                        errors = stats.errors,
                        "Check completed"
                    );
                    if !self.pause(self.timing.cycle_interval).await {
                        break;
                    }
                }
                CycleOutcome::RankingFailed => {
                    if !self.pause(self.timing.retry_backoff).await {
                        break;
                    }
                }
                CycleOutcome::Interrupted(stats) => {
                    debug!(
                        session = %self.session,
                        checked = stats.checked,
                        "Cycle interrupted by stop"
                    );
                    break;
                }
            }
        }

        Metrics::session_ended();
        info!(session = %self.session, cycles, "Monitoring loop exited");
        cycles
    }

    /// One pass over the ranking.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let symbols = match self.source.fetch_top_symbols().await {
            Ok(symbols) => symbols,
            Err(e) => {
                Metrics::fetch_error("ranking");
                warn!(
                    session = %self.session,
                    error = %e,
                    backoff_secs = self.timing.retry_backoff.as_secs(),
                    "Failed to fetch market cap ranking"
                );
                return CycleOutcome::RankingFailed;
            }
        };

        let mut stats = CycleStats {
            symbols: symbols.len(),
            ..CycleStats::default()
        };

        for symbol in &symbols {
            if self.should_stop() {
                return CycleOutcome::Interrupted(stats);
            }

            stats.checked += 1;
            match self.source.fetch_volume_signal(symbol).await {
                Ok(Some(sample)) => {
                    if let Some(alert) = AlertEvent::try_from_sample(symbol.clone(), sample) {
                        stats.alerts += 1;
                        Metrics::alert_emitted(symbol.as_str());
                        info!(
                            session = %self.session,
                            symbol = %symbol,
                            ratio = sample.ratio,
                            "Volume alert"
                        );
                        self.deliver(alert.format_message()).await;
                    }
                }
                Ok(None) => {
                    stats.no_signal += 1;
                }
                Err(e) => {
                    stats.errors += 1;
                    Metrics::fetch_error("kline");
                    warn!(
                        session = %self.session,
                        symbol = %symbol,
                        error = %e,
                        "Failed to fetch volume data"
                    );
                }
            }

            if !self.pause(self.timing.symbol_delay).await {
                return CycleOutcome::Interrupted(stats);
            }
        }

        CycleOutcome::Completed(stats)
    }

    /// Stop checkpoint.
    fn should_stop(&self) -> bool {
        self.cancel.is_cancelled() || !self.registry.is_enabled(self.session)
    }

    /// Sleep for `duration`. Returns `false` if cancelled while sleeping.
    async fn pause(&self, duration: Duration) -> bool {
        if duration.is_zero() {
            return !self.cancel.is_cancelled();
        }
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }

    async fn deliver(&self, text: String) {
        if let Err(e) = self.sink.send(self.session, text).await {
            Metrics::delivery_error();
            error!(session = %self.session, error = %e, "Error sending message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;
    use volspike_core::{Symbol, VolumeSample};
    use volspike_market::{MockMarketSource, MockVolumeResponse};

    fn fast_timing() -> MonitorTiming {
        MonitorTiming {
            cycle_interval: Duration::from_millis(20),
            symbol_delay: Duration::ZERO,
            retry_backoff: Duration::from_millis(20),
        }
    }

    fn sample(prev: f64, curr: f64) -> MockVolumeResponse {
        MockVolumeResponse::Sample(VolumeSample::from_volumes(prev, curr).unwrap())
    }

    struct Harness {
        source: Arc<MockMarketSource>,
        sink: Arc<RecordingSink>,
        registry: Arc<SessionRegistry>,
        cancel: CancellationToken,
        session: SessionId,
    }

    impl Harness {
        fn new(source: MockMarketSource) -> Self {
            let registry = Arc::new(SessionRegistry::in_memory());
            let session = SessionId::new(77);
            registry.enable(session);
            Self {
                source: Arc::new(source),
                sink: Arc::new(RecordingSink::new()),
                registry,
                cancel: CancellationToken::new(),
                session,
            }
        }

        fn monitor(&self) -> MonitorLoop {
            MonitorLoop::new(
                self.session,
                self.source.clone(),
                self.sink.clone(),
                self.registry.clone(),
                fast_timing(),
                self.cancel.clone(),
            )
        }
    }

    #[tokio::test]
    async fn test_cycle_alerts_above_threshold_only() {
        let eth = Symbol::from_base_asset("eth");
        let btc = Symbol::from_base_asset("btc");
        let sol = Symbol::from_base_asset("sol");
        let harness = Harness::new(
            MockMarketSource::new()
                .with_symbols(vec![eth.clone(), btc.clone(), sol.clone()])
                .with_volume(eth, sample(100.0, 600.0))
                .with_volume(btc, sample(100.0, 500.0))
                .with_volume(sol, MockVolumeResponse::NoSignal),
        );

        let outcome = harness.monitor().run_cycle().await;
        assert_eq!(
            outcome,
            CycleOutcome::Completed(CycleStats {
                symbols: 3,
                checked: 3,
                no_signal: 1,
                alerts: 1,
                errors: 0,
            })
        );

        let messages = harness.sink.messages_for(harness.session);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("⚠️ Volume Alert for ETHUSDT\n"));
        assert!(messages[0].contains("Previous Hour Volume: 100.00\n"));
        assert!(messages[0].contains("Current Hour Volume: 600.00\n"));
        assert!(messages[0].contains("Volume Ratio: 6.00x\n"));
    }

    #[tokio::test]
    async fn test_symbol_errors_do_not_abort_cycle() {
        let a = Symbol::from_base_asset("a");
        let b = Symbol::from_base_asset("b");
        let c = Symbol::from_base_asset("c");
        let harness = Harness::new(
            MockMarketSource::new()
                .with_symbols(vec![a.clone(), b.clone(), c.clone()])
                .with_volume(a.clone(), MockVolumeResponse::InsufficientData)
                .with_volume(b.clone(), MockVolumeResponse::NetworkError)
                .with_volume(c.clone(), sample(1.0, 10.0)),
        );

        let outcome = harness.monitor().run_cycle().await;
        match outcome {
            CycleOutcome::Completed(stats) => {
                assert_eq!(stats.errors, 2);
                assert_eq!(stats.alerts, 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(harness.source.volume_calls(), vec![a, b, c]);
    }

    #[tokio::test]
    async fn test_ranking_failure_reported() {
        let harness = Harness::new(MockMarketSource::new());
        harness.source.fail_next_symbols("connection refused");

        assert_eq!(
            harness.monitor().run_cycle().await,
            CycleOutcome::RankingFailed
        );
        assert!(harness.source.volume_calls().is_empty());
        assert!(harness.sink.messages().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_session_interrupts_before_next_symbol() {
        let a = Symbol::from_base_asset("a");
        let harness = Harness::new(MockMarketSource::new().with_symbols(vec![a.clone(), a]));
        harness.registry.disable(harness.session);

        let outcome = harness.monitor().run_cycle().await;
        assert_eq!(
            outcome,
            CycleOutcome::Interrupted(CycleStats {
                symbols: 2,
                ..CycleStats::default()
            })
        );
        assert!(harness.source.volume_calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_sends_started_and_stops_on_cancel() {
        let harness = Harness::new(
            MockMarketSource::new().with_symbols(vec![Symbol::from_base_asset("eth")]),
        );
        let monitor = harness.monitor();
        let handle = tokio::spawn(monitor.run());

        // Let a few cycles pass, then stop.
        tokio::time::timeout(Duration::from_secs(2), async {
            while harness.source.symbol_calls() < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        harness.cancel.cancel();

        let cycles = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(cycles >= 1);

        let messages = harness.sink.messages_for(harness.session);
        assert_eq!(messages[0], messages::STARTED);
    }

    #[tokio::test]
    async fn test_cancel_wakes_long_sleep() {
        let harness = Harness::new(MockMarketSource::new());
        let monitor = MonitorLoop::new(
            harness.session,
            harness.source.clone(),
            harness.sink.clone(),
            harness.registry.clone(),
            MonitorTiming {
                cycle_interval: Duration::from_secs(3600),
                symbol_delay: Duration::ZERO,
                retry_backoff: Duration::from_secs(3600),
            },
            harness.cancel.clone(),
        );
        let handle = tokio::spawn(monitor.run());

        tokio::time::timeout(Duration::from_secs(2), async {
            while harness.source.symbol_calls() < 1 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        harness.cancel.cancel();
        let cycles = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("loop should exit promptly after cancel")
            .unwrap();
        assert_eq!(cycles, 1);
    }

    #[tokio::test]
    async fn test_ranking_failure_retries_after_backoff() {
        let harness = Harness::new(
            MockMarketSource::new().with_symbols(vec![Symbol::from_base_asset("eth")]),
        );
        harness.source.fail_next_symbols("timeout");
        let handle = tokio::spawn(harness.monitor().run());

        tokio::time::timeout(Duration::from_secs(2), async {
            while harness.source.volume_calls().is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert!(harness.source.symbol_calls() >= 2);

        harness.cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_stop_loop() {
        let eth = Symbol::from_base_asset("eth");
        let harness = Harness::new(
            MockMarketSource::new()
                .with_symbols(vec![eth.clone()])
                .with_volume(eth, sample(1.0, 100.0)),
        );
        harness.sink.set_failing(true);

        let outcome = harness.monitor().run_cycle().await;
        assert!(matches!(outcome, CycleOutcome::Completed(s) if s.alerts == 1));
    }
}
