//! Concurrent session registry with persist-on-toggle.
//!
//! Readers (each monitoring loop's cancellation checkpoint, status
//! commands) hit the `DashMap` directly. Writers serialise on a mutex so
//! that each toggle is one atomic read-modify-persist of the full snapshot.

use crate::store::SessionStore;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::info;
use volspike_core::{MonitorState, SessionId};

/// Shared mapping session id -> monitoring enabled.
#[derive(Debug)]
pub struct SessionRegistry {
    states: DashMap<SessionId, bool>,
    /// Backing store; `None` keeps state in memory only.
    store: Option<SessionStore>,
    write_lock: Mutex<()>,
}

impl SessionRegistry {
    /// Registry persisted to `store`. Call `restore` to load prior state.
    pub fn new(store: SessionStore) -> Self {
        Self {
            states: DashMap::new(),
            store: Some(store),
            write_lock: Mutex::new(()),
        }
    }

    /// Registry without durable storage.
    pub fn in_memory() -> Self {
        Self {
            states: DashMap::new(),
            store: None,
            write_lock: Mutex::new(()),
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.store.is_some()
    }

    /// Load the persisted mapping and return the sessions to resume, sorted.
    pub fn restore(&self) -> Vec<SessionId> {
        let Some(store) = &self.store else {
            return Vec::new();
        };

        let _guard = self.write_lock.lock();
        let loaded = store.load();
        for (id, enabled) in &loaded {
            self.states.insert(*id, *enabled);
        }

        let enabled = self.enabled_sessions();
        info!(
            sessions = loaded.len(),
            enabled = enabled.len(),
            "Restored session states"
        );
        enabled
    }

    /// Turn monitoring on. Returns `false` if it already was (nothing persisted).
    pub fn enable(&self, id: SessionId) -> bool {
        self.set(id, true)
    }

    /// Turn monitoring off. Returns `false` if it already was (nothing persisted).
    pub fn disable(&self, id: SessionId) -> bool {
        self.set(id, false)
    }

    fn set(&self, id: SessionId, enabled: bool) -> bool {
        let _guard = self.write_lock.lock();

        // Unknown sessions count as disabled.
        let current = self.is_enabled(id);
        if current == enabled {
            return false;
        }

        self.states.insert(id, enabled);
        // Synchronous write of one small document; async callers block for
        // one fsync. A failed save only logs, the in-memory flag stands.
        if let Some(store) = &self.store {
            store.save(&self.snapshot());
        }
        true
    }

    /// Unknown sessions are disabled.
    pub fn is_enabled(&self, id: SessionId) -> bool {
        self.states.get(&id).map(|v| *v).unwrap_or(false)
    }

    pub fn state(&self, id: SessionId) -> MonitorState {
        MonitorState::from_enabled(self.is_enabled(id))
    }

    /// Copy of every known session, enabled or not.
    pub fn snapshot(&self) -> HashMap<SessionId, bool> {
        self.states
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect()
    }

    pub fn enabled_sessions(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self
            .states
            .iter()
            .filter(|entry| *entry.value())
            .map(|entry| *entry.key())
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
