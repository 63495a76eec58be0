//! Durable client-side session state
//!
//! The conversation session identifier and the base URL override survive
//! process restarts. [`FileSessionStore`] keeps them in a small JSON file
//! under the user's data directory; [`MemorySessionStore`] keeps them for
//! the lifetime of the process only.

use crate::error::{LeadchatError, Result};
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub mod id;

/// Environment variable that overrides the session file location
pub const SESSION_FILE_ENV: &str = "LEADCHAT_SESSION_FILE";

/// Everything persisted between runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    /// Conversation session identifier, service-assigned or a `web_` placeholder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Base URL chosen at runtime through the debug surface
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url_override: Option<String>,

    /// Last write time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Storage backend for [`PersistedState`]
///
/// Implementations only need `load` and `save`; the accessors are built on
/// top of them. Concurrent writers (two processes sharing a file) race and
/// the last write wins.
pub trait SessionStore: Send + Sync {
    /// Read the current state; a missing backing store yields the default
    fn load(&self) -> Result<PersistedState>;

    /// Replace the stored state
    fn save(&self, state: &PersistedState) -> Result<()>;

    /// Persisted session identifier, if any
    fn session_id(&self) -> Result<Option<String>> {
        Ok(self.load()?.session_id)
    }

    /// Persist a session identifier, overwriting the previous one
    fn set_session_id(&self, session_id: &str) -> Result<()> {
        let mut state = self.load()?;
        state.session_id = Some(session_id.to_string());
        state.updated_at = Some(Utc::now());
        self.save(&state)
    }

    /// Forget the session identifier
    fn clear_session_id(&self) -> Result<()> {
        let mut state = self.load()?;
        state.session_id = None;
        state.updated_at = Some(Utc::now());
        self.save(&state)
    }

    /// Persisted base URL override, if any
    fn base_url_override(&self) -> Result<Option<String>> {
        Ok(self.load()?.base_url_override)
    }

    /// Persist a base URL override
    fn set_base_url_override(&self, base_url: &str) -> Result<()> {
        let mut state = self.load()?;
        state.base_url_override = Some(base_url.to_string());
        state.updated_at = Some(Utc::now());
        self.save(&state)
    }
}

/// JSON file backed session store
pub struct FileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    /// Open the store at the default location
    ///
    /// Honors `LEADCHAT_SESSION_FILE`, otherwise uses `session.json` in the
    /// platform data directory.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var(SESSION_FILE_ENV) {
            return Ok(Self::with_path(override_path));
        }

        let proj_dirs = ProjectDirs::from("com", "leadchat", "leadchat")
            .ok_or_else(|| LeadchatError::Storage("Could not determine data directory".into()))?;

        Ok(Self::with_path(proj_dirs.data_dir().join("session.json")))
    }

    /// Open the store at an explicit path
    ///
    /// Nothing is created until the first write.
    ///
    /// # Examples
    ///
    /// ```
    /// use leadchat::session::{FileSessionStore, SessionStore};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = FileSessionStore::with_path(dir.path().join("session.json"));
    /// assert_eq!(store.session_id().unwrap(), None);
    /// ```
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<PersistedState> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| LeadchatError::Storage("session store lock poisoned".into()))?;

        if !self.path.exists() {
            return Ok(PersistedState::default());
        }

        let contents = std::fs::read_to_string(&self.path).map_err(|e| {
            LeadchatError::Storage(format!("Failed to read {}: {}", self.path.display(), e))
        })?;

        if contents.trim().is_empty() {
            return Ok(PersistedState::default());
        }

        match serde_json::from_str(&contents) {
            Ok(state) => Ok(state),
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable session file {}: {}",
                    self.path.display(),
                    e
                );
                Ok(PersistedState::default())
            }
        }
    }

    fn save(&self, state: &PersistedState) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| LeadchatError::Storage("session store lock poisoned".into()))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                LeadchatError::Storage(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let json = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, json).map_err(|e| {
            LeadchatError::Storage(format!("Failed to write {}: {}", self.path.display(), e))
        })?;

        tracing::debug!(path = %self.path.display(), "Session state saved");
        Ok(())
    }
}

/// Process-local session store
#[derive(Default)]
pub struct MemorySessionStore {
    state: Mutex<PersistedState>,
}

impl MemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<PersistedState> {
        self.state
            .lock()
            .map(|state| state.clone())
            .map_err(|_| LeadchatError::Storage("session store lock poisoned".into()).into())
    }

    fn save(&self, state: &PersistedState) -> Result<()> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| LeadchatError::Storage("session store lock poisoned".into()))?;
        *guard = state.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::with_path(dir.path().join("nested/session.json"));
        assert_eq!(store.load().unwrap(), PersistedState::default());
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/session.json");

        let store = FileSessionStore::with_path(&path);
        store.set_session_id("sess-1").unwrap();
        store.set_base_url_override("http://api:1").unwrap();

        let reopened = FileSessionStore::with_path(&path);
        assert_eq!(reopened.session_id().unwrap().as_deref(), Some("sess-1"));
        assert_eq!(
            reopened.base_url_override().unwrap().as_deref(),
            Some("http://api:1")
        );
        assert!(reopened.load().unwrap().updated_at.is_some());
    }

    #[test]
    fn test_clear_keeps_base_url_override() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::with_path(dir.path().join("session.json"));
        store.set_session_id("sess-1").unwrap();
        store.set_base_url_override("http://api:1").unwrap();

        store.clear_session_id().unwrap();

        assert_eq!(store.session_id().unwrap(), None);
        assert_eq!(
            store.base_url_override().unwrap().as_deref(),
            Some("http://api:1")
        );
    }

    #[test]
    fn test_file_store_tolerates_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileSessionStore::with_path(&path);
        assert_eq!(store.load().unwrap(), PersistedState::default());

        store.set_session_id("fresh").unwrap();
        assert_eq!(store.session_id().unwrap().as_deref(), Some("fresh"));
    }

    #[test]
    fn test_memory_store_overwrites() {
        let store = MemorySessionStore::new();
        store.set_session_id("a").unwrap();
        store.set_session_id("b").unwrap();
        assert_eq!(store.session_id().unwrap().as_deref(), Some("b"));
        store.clear_session_id().unwrap();
        assert_eq!(store.session_id().unwrap(), None);
    }
}
