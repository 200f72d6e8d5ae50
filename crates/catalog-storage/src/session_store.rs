//! High-level API over the three session slots.

use crate::{SecureStorage, StorageKeys, StorageResult};
use tracing::{debug, warn};

/// A complete persisted session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: String,
}

/// Reads and writes the persisted session triple.
pub struct SessionStore {
    storage: Box<dyn SecureStorage>,
}

impl SessionStore {
    /// Create a new session store with the given storage backend
    pub fn new(storage: Box<dyn SecureStorage>) -> Self {
        Self { storage }
    }

    /// Load the persisted session.
    ///
    /// Returns `None` unless all three slots are present. A partial triple
    /// is left over from an interrupted write and is never restored.
    pub fn load_session(&self) -> StorageResult<Option<StoredSession>> {
        let access_token = self.storage.get(StorageKeys::ACCESS_TOKEN)?;
        let refresh_token = self.storage.get(StorageKeys::REFRESH_TOKEN)?;
        let user = self.storage.get(StorageKeys::USER)?;

        match (access_token, refresh_token, user) {
            (Some(access_token), Some(refresh_token), Some(user)) => Ok(Some(StoredSession {
                access_token,
                refresh_token,
                user,
            })),
            (None, None, None) => Ok(None),
            _ => {
                warn!("Ignoring incomplete persisted session");
                Ok(None)
            }
        }
    }

    /// Store all three session values as one unit.
    pub fn set_session(&self, access_token: &str, refresh_token: &str, user: &str) -> StorageResult<()> {
        self.storage.set_many(&[
            (StorageKeys::ACCESS_TOKEN, access_token),
            (StorageKeys::REFRESH_TOKEN, refresh_token),
            (StorageKeys::USER, user),
        ])
    }

    /// Remove all three session values. Missing slots are not an error.
    pub fn clear_session(&self) -> StorageResult<()> {
        self.storage.delete_many(&StorageKeys::SESSION)?;
        debug!("Cleared persisted session");
        Ok(())
    }
}
