//! Storage trait definitions.

use crate::StorageResult;

/// Trait for durable key/value backends.
pub trait SecureStorage: Send + Sync {
    /// Store a value
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Retrieve a value
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Delete a value, returning whether it existed
    fn delete(&self, key: &str) -> StorageResult<bool>;

    /// Check if a key exists
    fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Store several values as one unit.
    ///
    /// Backends that cannot write atomically fall back to one `set` per
    /// entry. If any of them fails, every key in the batch is deleted so the
    /// slots never hold a mix of old and new values.
    fn set_many(&self, entries: &[(&str, &str)]) -> StorageResult<()> {
        for (key, value) in entries {
            if let Err(e) = self.set(key, value) {
                for (key, _) in entries {
                    let _ = self.delete(key);
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Delete several values. Missing keys are not an error.
    fn delete_many(&self, keys: &[&str]) -> StorageResult<()> {
        for key in keys {
            self.delete(key)?;
        }
        Ok(())
    }
}
