mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::cli::Args;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

pub const THEME_KEY: &str = "theme";
pub const USER_NAME_KEY: &str = "userName";
pub const GUEST_ID_KEY: &str = "guest_id";
pub const SESSION_KEY: &str = "session";
pub const INSTALL_DISMISSED_KEY: &str = "pwa-dismissed";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt storage file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// String key/value persistence, the local-storage analogue of the client.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes every pair in one step; either all values land or none do.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.set_many(&[(key, value)])
    }
}

pub fn default_storage_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("orion-chat").join("storage.json"))
}

pub fn create_local_store(args: &Args) -> Result<Arc<dyn LocalStore>, StorageError> {
    if args.ephemeral {
        info!("Using in-memory storage; nothing will be persisted");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let path = match &args.storage_path {
        Some(path) => PathBuf::from(path),
        None =>
            default_storage_path().ok_or_else(|| {
                StorageError::Unavailable("no data directory for this platform".to_string())
            })?,
    };
    info!("Local storage file: {}", path.display());
    Ok(Arc::new(FileStore::new(path)))
}

/// Stand-in used when no store could be opened; every access fails.
pub struct UnavailableStore;

impl LocalStore for UnavailableStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }

    fn set_many(&self, _entries: &[(&str, &str)]) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }
}
