//! Durable key/value storage for the catalog admin session.
//!
//! The session survives process restarts through three string slots
//! (`access_token`, `refresh_token`, `user`). Backends:
//! - **File**: a JSON object on disk, readable only by the owner
//! - **Memory**: process-local, for tests and throwaway sessions

mod file;
mod keys;
mod memory;
mod session_store;
mod traits;

pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use session_store::{SessionStore, StoredSession};
pub use traits::SecureStorage;

use std::path::Path;
use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific failure
    #[error("Platform storage error: {0}")]
    Platform(String),

    /// Stored data could not be decoded
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Create a SessionStore backed by the JSON file at `path`.
pub fn create_session_store(path: &Path) -> SessionStore {
    SessionStore::new(Box::new(FileStorage::new(path)))
}
