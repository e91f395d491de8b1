//! Session lifecycle supervisor.
//!
//! Owns the monitoring loop task of every running session. The session
//! registry is the source of truth for whether a session should be
//! running; the supervisor keeps one task per enabled session and the
//! cancellation token used to stop it.

use crate::monitor::{MonitorLoop, MonitorTiming};
use crate::sink::AlertSink;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use volspike_core::{MonitorState, SessionId};
use volspike_market::MarketDataSource;
use volspike_store::SessionRegistry;

/// Result of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

/// Result of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

struct RunningLoop {
    generation: u64,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Starts, stops and resumes per-session monitoring loops.
pub struct Supervisor {
    source: Arc<dyn MarketDataSource>,
    sink: Arc<dyn AlertSink>,
    registry: Arc<SessionRegistry>,
    timing: MonitorTiming,
    loops: Arc<DashMap<SessionId, RunningLoop>>,
    next_generation: AtomicU64,
}

impl Supervisor {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        sink: Arc<dyn AlertSink>,
        registry: Arc<SessionRegistry>,
        timing: MonitorTiming,
    ) -> Self {
        Self {
            source,
            sink,
            registry,
            timing,
            loops: Arc::new(DashMap::new()),
            next_generation: AtomicU64::new(1),
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn sink(&self) -> &Arc<dyn AlertSink> {
        &self.sink
    }

    /// Enable monitoring for `session` and spawn its loop.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, session: SessionId) -> StartOutcome {
        if !self.registry.enable(session) {
            debug!(session = %session, "Start ignored, already running");
            return StartOutcome::AlreadyRunning;
        }
        self.spawn_loop(session);
        info!(session = %session, "Monitoring enabled");
        StartOutcome::Started
    }

    /// Disable monitoring for `session` and signal its loop to exit.
    pub fn stop(&self, session: SessionId) -> StopOutcome {
        if !self.registry.disable(session) {
            debug!(session = %session, "Stop ignored, not running");
            return StopOutcome::NotRunning;
        }
        if let Some((_, running)) = self.loops.remove(&session) {
            running.cancel.cancel();
        }
        info!(session = %session, "Monitoring disabled");
        StopOutcome::Stopped
    }

    pub fn status(&self, session: SessionId) -> MonitorState {
        self.registry.state(session)
    }

    /// Spawn loops for every session persisted as enabled.
    ///
    /// Returns the resumed sessions. Must be called from within a tokio
    /// runtime.
    pub fn resume(&self) -> Vec<SessionId> {
        let sessions = self.registry.restore();
        for session in &sessions {
            if !self.loops.contains_key(session) {
                self.spawn_loop(*session);
            }
        }
        if !sessions.is_empty() {
            info!(count = sessions.len(), "Resumed monitoring sessions");
        }
        sessions
    }

    /// Number of live loop tasks.
    pub fn active_loops(&self) -> usize {
        self.loops.len()
    }

    pub fn is_looping(&self, session: SessionId) -> bool {
        self.loops.contains_key(&session)
    }

    /// Cancel every loop and wait up to `grace` for them to exit.
    ///
    /// Enabled flags stay persisted so the sessions resume on next start.
    pub async fn shutdown(&self, grace: Duration) {
        let sessions: Vec<SessionId> = self.loops.iter().map(|entry| *entry.key()).collect();
        let mut handles = Vec::with_capacity(sessions.len());
        for session in sessions {
            if let Some((_, running)) = self.loops.remove(&session) {
                running.cancel.cancel();
                handles.push((session, running.handle));
            }
        }

        for (session, handle) in handles {
            match tokio::time::timeout(grace, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(session = %session, error = %e, "Monitoring task failed"),
                Err(_) => warn!(session = %session, "Monitoring task did not exit in time"),
            }
        }
        info!("Supervisor shut down");
    }

    fn spawn_loop(&self, session: SessionId) {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let monitor = MonitorLoop::new(
            session,
            self.source.clone(),
            self.sink.clone(),
            self.registry.clone(),
            self.timing,
            cancel.clone(),
        );

        let loops = self.loops.clone();
        let handle = tokio::spawn(async move {
            monitor.run().await;
            loops.remove_if(&session, |_, running| running.generation == generation);
        });

        // A previous loop still winding down after a quick stop/start
        // observes its own token and exits.
        if let Some(previous) = self.loops.insert(
            session,
            RunningLoop {
                generation,
                cancel,
                handle,
            },
        ) {
            previous.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages;
    use crate::sink::RecordingSink;
    use volspike_core::Symbol;
    use volspike_market::MockMarketSource;
    use volspike_store::SessionStore;

    fn timing() -> MonitorTiming {
        MonitorTiming {
            cycle_interval: Duration::from_secs(3600),
            symbol_delay: Duration::ZERO,
            retry_backoff: Duration::from_secs(3600),
        }
    }

    fn supervisor(registry: SessionRegistry) -> (Supervisor, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let source = Arc::new(
            MockMarketSource::new().with_symbols(vec![Symbol::from_base_asset("eth")]),
        );
        let supervisor = Supervisor::new(source, sink.clone(), Arc::new(registry), timing());
        (supervisor, sink)
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached");
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let (supervisor, sink) = supervisor(SessionRegistry::in_memory());
        let session = SessionId::new(1);

        assert_eq!(supervisor.start(session), StartOutcome::Started);
        assert_eq!(supervisor.start(session), StartOutcome::AlreadyRunning);
        assert_eq!(supervisor.active_loops(), 1);
        assert_eq!(supervisor.status(session), MonitorState::Running);

        wait_until(|| !sink.messages_for(session).is_empty()).await;
        assert_eq!(sink.messages_for(session), vec![messages::STARTED]);

        supervisor.shutdown(Duration::from_secs(1)).await;
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_and_ends_loop() {
        let (supervisor, _sink) = supervisor(SessionRegistry::in_memory());
        let session = SessionId::new(2);

        assert_eq!(supervisor.stop(session), StopOutcome::NotRunning);
        supervisor.start(session);
        assert_eq!(supervisor.stop(session), StopOutcome::Stopped);
        assert_eq!(supervisor.stop(session), StopOutcome::NotRunning);
        assert_eq!(supervisor.status(session), MonitorState::Stopped);
        assert!(!supervisor.is_looping(session));
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let (supervisor, _sink) = supervisor(SessionRegistry::in_memory());
        let a = SessionId::new(10);
        let b = SessionId::new(-20);

        supervisor.start(a);
        supervisor.start(b);
        supervisor.stop(a);

        assert_eq!(supervisor.status(a), MonitorState::Stopped);
        assert_eq!(supervisor.status(b), MonitorState::Running);
        assert!(supervisor.is_looping(b));

        supervisor.shutdown(Duration::from_secs(1)).await;
    }

    #[tokio::test]
    async fn test_restart_after_stop_spawns_new_loop() {
        let (supervisor, sink) = supervisor(SessionRegistry::in_memory());
        let session = SessionId::new(3);

        supervisor.start(session);
        supervisor.stop(session);
        assert_eq!(supervisor.start(session), StartOutcome::Started);
        assert!(supervisor.is_looping(session));

        wait_until(|| sink.messages_for(session).len() >= 2).await;
        supervisor.shutdown(Duration::from_secs(1)).await;
        assert_eq!(supervisor.active_loops(), 0);
    }

    #[tokio::test]
    async fn test_start_runs_when_persistence_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        std::fs::create_dir_all(path.join("occupied")).unwrap();
        let (supervisor, sink) = supervisor(SessionRegistry::new(SessionStore::new(&path)));
        let session = SessionId::new(11);

        assert_eq!(supervisor.start(session), StartOutcome::Started);
        assert_eq!(supervisor.status(session), MonitorState::Running);
        assert!(supervisor.is_looping(session));

        wait_until(|| !sink.messages_for(session).is_empty()).await;
        assert_eq!(sink.messages_for(session), vec![messages::STARTED]);

        assert_eq!(supervisor.stop(session), StopOutcome::Stopped);
        assert_eq!(supervisor.status(session), MonitorState::Stopped);
    }

    #[tokio::test]
    async fn test_resume_after_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        let session = SessionId::new(-1001234);

        {
            let (supervisor, _sink) = supervisor(SessionRegistry::new(SessionStore::new(&path)));
            supervisor.start(session);
            supervisor.start(SessionId::new(5));
            supervisor.stop(SessionId::new(5));
            supervisor.shutdown(Duration::from_secs(1)).await;
        }

        let (supervisor, sink) = supervisor(SessionRegistry::new(SessionStore::new(&path)));
        assert_eq!(supervisor.resume(), vec![session]);
        assert!(supervisor.is_looping(session));
        assert_eq!(supervisor.status(SessionId::new(5)), MonitorState::Stopped);

        wait_until(|| !sink.messages_for(session).is_empty()).await;
        supervisor.shutdown(Duration::from_secs(1)).await;
    }
}
