use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::StorageError;
use crate::models::session::PersistedSession;

/// Long-lived storage for the persisted subset of a session
/// (local storage in a browser).
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Option<PersistedSession>, StorageError>;
    fn save(&self, session: &PersistedSession) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
    fn is_persistent(&self) -> bool {
        // Real backends survive a restart; the in-memory one returns false
        // so logs can say why nothing was restored.
        true
    }
}

/// Creates a storage backend from the client config: a JSON file when
/// `storage_path` is set, otherwise memory only.
pub fn create_storage(config: &ClientConfig) -> Arc<dyn SessionStorage> {
    match &config.storage_path {
        Some(path) => {
            info!("Persisting session subset to '{}'", path);
            Arc::new(FileStorage::new(path))
        }
        None => {
            info!("No storage_path configured. Session subset kept in memory only.");
            Arc::new(MemoryStorage::new())
        }
    }
}

/// Keeps the persisted subset in memory; nothing survives the process.
#[derive(Default)]
pub struct MemoryStorage {
    document: Mutex<Option<PersistedSession>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A storage that already holds `session`, as if written by a previous run.
    pub fn with_document(session: PersistedSession) -> Self {
        MemoryStorage {
            document: Mutex::new(Some(session)),
        }
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<PersistedSession>, StorageError> {
        Ok(self.document.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, session: &PersistedSession) -> Result<(), StorageError> {
        *self.document.lock().unwrap_or_else(|e| e.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.document.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        false
    }
}

/// Stores the persisted subset as a JSON document on disk.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStorage { path: path.into() }
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Option<PersistedSession>, StorageError> {
        if !self.path.exists() {
            debug!("No session document at '{}'", self.path.display());
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, session: &PersistedSession) -> Result<(), StorageError> {
        let raw = serde_json::to_string(session)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
