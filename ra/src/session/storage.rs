//! Durable storage for the session entry

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors from reading or writing the persisted session
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Session storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session storage encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Session storage unavailable: {0}")]
    Unavailable(String),
}

/// What gets persisted: the bearer token and the identity it was issued to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    pub username: String,
}

/// Backend for the single durable session entry
pub trait SessionStorage: Send + Sync {
    /// Read the persisted entry; `Ok(None)` means nothing stored
    fn load(&self) -> Result<Option<StoredSession>, StorageError>;

    /// Overwrite the persisted entry
    fn save(&self, session: &StoredSession) -> Result<(), StorageError>;

    /// Remove the persisted entry (no-op when absent)
    fn clear(&self) -> Result<(), StorageError>;
}

/// JSON file on disk
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Option<StoredSession>, StorageError> {
        debug!(path = %self.path.display(), "FileStorage::load: called");
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;

        // A half-written or foreign entry counts as no session at all
        match serde_json::from_str::<StoredSession>(&content) {
            Ok(s) if !s.token.is_empty() && !s.username.is_empty() => Ok(Some(s)),
            Ok(_) => {
                debug!("FileStorage::load: entry has empty fields, ignoring");
                Ok(None)
            }
            Err(e) => {
                debug!(error = %e, "FileStorage::load: unparseable entry, ignoring");
                Ok(None)
            }
        }
    }

    fn save(&self, session: &StoredSession) -> Result<(), StorageError> {
        debug!(path = %self.path.display(), "FileStorage::save: called");
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        debug!(path = %self.path.display(), "FileStorage::clear: called");
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local storage
///
/// Clones share the same slot, so a test can hand one clone to a store,
/// drop the store, and initialize a fresh one from another clone to simulate
/// a restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<StoredSession>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that already holds an entry
    pub fn with_session(token: impl Into<String>, username: impl Into<String>) -> Self {
        let storage = Self::default();
        if let Ok(mut slot) = storage.slot.lock() {
            *slot = Some(StoredSession {
                token: token.into(),
                username: username.into(),
            });
        }
        storage
    }

    /// Peek at the stored entry
    pub fn stored(&self) -> Option<StoredSession> {
        self.slot.lock().ok().and_then(|s| s.clone())
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<StoredSession>, StorageError> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| StorageError::Unavailable("memory slot poisoned".to_string()))?;
        Ok(slot.clone())
    }

    fn save(&self, session: &StoredSession) -> Result<(), StorageError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| StorageError::Unavailable("memory slot poisoned".to_string()))?;
        *slot = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| StorageError::Unavailable("memory slot poisoned".to_string()))?;
        *slot = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> StoredSession {
        StoredSession {
            token: "tok-123".to_string(),
            username: "hr_manager".to_string(),
        }
    }

    #[test]
    fn test_file_storage_round_trip() {
        let temp = TempDir::new().unwrap();
        let storage = FileStorage::new(temp.path().join("nested").join("session.json"));

        assert_eq!(storage.load().unwrap(), None);

        storage.save(&sample()).unwrap();
        assert_eq!(storage.load().unwrap(), Some(sample()));

        storage.clear().unwrap();
        assert_eq!(storage.load().unwrap(), None);

        // Clearing twice is fine
        storage.clear().unwrap();
    }

    #[test]
    fn test_file_storage_ignores_garbage() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("session.json");

        fs::write(&path, "not json").unwrap();
        assert_eq!(FileStorage::new(&path).load().unwrap(), None);

        // A bare token without identity is not a session
        fs::write(&path, r#"{"token": "abc"}"#).unwrap();
        assert_eq!(FileStorage::new(&path).load().unwrap(), None);

        fs::write(&path, r#"{"token": "", "username": "bob"}"#).unwrap();
        assert_eq!(FileStorage::new(&path).load().unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_storage_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let storage = FileStorage::new(temp.path().join("session.json"));
        storage.save(&sample()).unwrap();

        let mode = fs::metadata(storage.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_memory_storage_clones_share_slot() {
        let a = MemoryStorage::new();
        let b = a.clone();

        a.save(&sample()).unwrap();
        assert_eq!(b.load().unwrap(), Some(sample()));

        b.clear().unwrap();
        assert_eq!(a.stored(), None);
    }
}
