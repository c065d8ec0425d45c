//! Session persistence. A store holds the five string-valued session slots
//! and applies every mutation as a single unit, so a reader never observes a
//! token without its paired user record or a half-cleared session.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to persist session: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The slots that make up one session record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    Token,
    User,
    TempToken,
    PendingEmail,
    ResetToken,
}

impl SessionKey {
    pub const ALL: [SessionKey; 5] = [
        SessionKey::Token,
        SessionKey::User,
        SessionKey::TempToken,
        SessionKey::PendingEmail,
        SessionKey::ResetToken,
    ];

    /// Storage name for the slot. These match the names the web frontend
    /// uses in `localStorage`, so a file exported from there reads as-is.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionKey::Token => "authToken",
            SessionKey::User => "user",
            SessionKey::TempToken => "tempToken",
            SessionKey::PendingEmail => "userEmail",
            SessionKey::ResetToken => "resetToken",
        }
    }
}

/// Backend holding the session record.
///
/// Reads never fail: corrupt or missing backing data reads as absent.
/// `apply` must be all-or-nothing across the given changes.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: SessionKey) -> Option<String>;
    fn apply(&self, changes: &[(SessionKey, Option<String>)]) -> Result<(), StoreError>;
}

/// In-memory store, the default when no session file is configured and the
/// substitute used by tests.
#[derive(Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<SessionKey, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: SessionKey) -> Option<String> {
        let slots = self.slots.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        slots.get(&key).cloned()
    }

    fn apply(&self, changes: &[(SessionKey, Option<String>)]) -> Result<(), StoreError> {
        let mut slots = self.slots.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for (key, value) in changes {
            match value {
                Some(value) => {
                    slots.insert(*key, value.clone());
                }
                None => {
                    slots.remove(key);
                }
            }
        }
        Ok(())
    }
}

/// File-backed store: one JSON object per session file. `apply` rewrites the
/// whole file through a temp file and rename, so a crash mid-write leaves
/// either the old record or the new one, never a mix.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> HashMap<String, String> {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return HashMap::new();
        };

        match serde_json::from_str(&raw) {
            Ok(slots) => slots,
            Err(err) => {
                debug!("unreadable session file {}: {err}", self.path.display());
                HashMap::new()
            }
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut path = self.path.clone().into_os_string();
        path.push(".tmp");
        PathBuf::from(path)
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: SessionKey) -> Option<String> {
        self.load().get(key.as_str()).cloned()
    }

    fn apply(&self, changes: &[(SessionKey, Option<String>)]) -> Result<(), StoreError> {
        let mut slots = self.load();
        for (key, value) in changes {
            match value {
                Some(value) => {
                    slots.insert(key.as_str().to_string(), value.clone());
                }
                None => {
                    slots.remove(key.as_str());
                }
            }
        }

        if let Some(parent) = self.path.parent().filter(|p| *p != Path::new("")) {
            fs::create_dir_all(parent)?;
        }

        let temp = self.temp_path();
        fs::write(&temp, serde_json::to_string_pretty(&slots)?)?;
        fs::rename(&temp, &self.path)?;

        Ok(())
    }
}
