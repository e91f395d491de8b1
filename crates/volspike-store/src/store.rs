//! JSON document store for session states.
//!
//! The whole mapping is written to a sibling temp file and renamed over the
//! target, so a crash mid-write leaves the previous document intact.
//! Failures are logged and swallowed by `load`/`save`; the `try_*`
//! variants expose them.

use crate::error::PersistenceResult;
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use volspike_core::SessionId;

/// Default location of the status document.
pub const DEFAULT_STATUS_FILE: &str = "monitoring_status.json";

/// File-backed store for the session state mapping.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the mapping. Missing file is an empty mapping.
    pub fn try_load(&self) -> PersistenceResult<HashMap<SessionId, bool>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };

        if data.trim().is_empty() {
            return Ok(HashMap::new());
        }

        Ok(serde_json::from_str(&data)?)
    }

    /// Load the mapping, logging and discarding any error.
    pub fn load(&self) -> HashMap<SessionId, bool> {
        match self.try_load() {
            Ok(states) => {
                debug!(
                    path = %self.path.display(),
                    sessions = states.len(),
                    "Loaded session states"
                );
                states
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to load session states");
                HashMap::new()
            }
        }
    }

    /// Overwrite the document with `states`.
    pub fn try_save(&self, states: &HashMap<SessionId, bool>) -> PersistenceResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(states)?;
        let tmp_path = self.tmp_path();

        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Overwrite the document, logging and discarding any error.
    pub fn save(&self, states: &HashMap<SessionId, bool>) {
        match self.try_save(states) {
            Ok(()) => {
                debug!(
                    path = %self.path.display(),
                    sessions = states.len(),
                    "Saved session states"
                );
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to save session states");
            }
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_FILE)
    }
}
