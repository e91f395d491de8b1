//! Session identification and monitoring state.
//!
//! A session is one independently monitored conversation (a chat on the
//! messaging platform, or the single console session). Each session maps to
//! exactly one current on/off state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque session identifier (the chat id on the messaging platform).
///
/// Serializes as a bare integer, so a `HashMap<SessionId, bool>` becomes
/// `{"12345": true}` in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub i64);

impl SessionId {
    /// Session used by the standalone console mode.
    pub const CONSOLE: Self = Self(0);

    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SessionId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Monitoring state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorState {
    #[default]
    Stopped,
    Running,
}

impl MonitorState {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            Self::Running
        } else {
            Self::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Running => write!(f, "running"),
        }
    }
}
