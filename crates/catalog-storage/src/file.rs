//! File-backed storage.
//!
//! All slots live in one JSON object file. The file is created with 0600
//! permissions on unix and rewritten in full on every mutation, through a
//! sibling temp file that is renamed over the original.

use crate::{SecureStorage, StorageError, StorageResult};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// JSON file storage.
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    /// Create a storage over `path`. The file is not touched until the first
    /// write; a missing file reads as empty.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> StorageResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&contents).map_err(|e| {
            StorageError::Encoding(format!("{}: {}", self.path.display(), e))
        })
    }

    /// Sibling file the next contents are staged in before the rename.
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Replace the file contents. The previous file stays intact until the
    /// new contents are fully on disk.
    fn write_all(&self, data: &BTreeMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(data)
            .map_err(|e| StorageError::Encoding(e.to_string()))?;

        let temp = self.temp_path();
        if let Err(e) = write_owner_only(&temp, contents.as_bytes()) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

fn write_owner_only(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

impl SecureStorage for FileStorage {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let _guard = self.lock.lock();
        let mut data = self.read_all()?;
        data.insert(key.to_string(), value.to_string());
        self.write_all(&data)
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(key))
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        let _guard = self.lock.lock();
        let mut data = self.read_all()?;
        let existed = data.remove(key).is_some();
        if existed {
            self.write_all(&data)?;
        }
        Ok(existed)
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> StorageResult<()> {
        let _guard = self.lock.lock();
        let mut data = self.read_all()?;
        for (key, value) in entries {
            data.insert(key.to_string(), value.to_string());
        }
        self.write_all(&data)
    }

    fn delete_many(&self, keys: &[&str]) -> StorageResult<()> {
        let _guard = self.lock.lock();
        let mut data = self.read_all()?;
        let before = data.len();
        for key in keys {
            data.remove(*key);
        }
        if data.len() != before {
            self.write_all(&data)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(&dir.path().join("absent.json"));

        assert_eq!(storage.get("access_token").unwrap(), None);
        assert!(!storage.delete("access_token").unwrap());
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_set_get_delete() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(&dir.path().join("nested").join("session.json"));

        storage.set("user", "alice").unwrap();
        storage.set("access_token", "abc").unwrap();
        assert_eq!(storage.get("user").unwrap(), Some("alice".to_string()));

        assert!(storage.delete("user").unwrap());
        assert_eq!(storage.get("user").unwrap(), None);
        assert_eq!(storage.get("access_token").unwrap(), Some("abc".to_string()));
    }

    #[test]
    fn test_corrupt_file_is_encoding_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        let storage = FileStorage::new(&path);
        assert!(matches!(storage.get("user"), Err(StorageError::Encoding(_))));
    }

    #[test]
    fn test_set_many_writes_all_entries_together() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(&dir.path().join("session.json"));
        storage.set("user", "alice").unwrap();

        storage
            .set_many(&[("access_token", "a2"), ("refresh_token", "r2"), ("user", "bob")])
            .unwrap();

        let contents: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(storage.path()).unwrap()).unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents["user"], "bob");

        storage.delete_many(&["access_token", "refresh_token", "user"]).unwrap();
        assert_eq!(storage.get("access_token").unwrap(), None);
        assert_eq!(storage.get("user").unwrap(), None);
    }

    #[test]
    fn test_rewrite_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(&dir.path().join("session.json"));

        storage.set("access_token", "a1").unwrap();
        storage.set("access_token", "a2").unwrap();

        assert!(!storage.temp_path().exists());
        assert_eq!(storage.get("access_token").unwrap(), Some("a2".to_string()));
    }

    #[test]
    fn test_failed_write_keeps_previous_file() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(&dir.path().join("session.json"));
        storage
            .set_many(&[("access_token", "a1"), ("refresh_token", "r1"), ("user", "alice")])
            .unwrap();

        // A directory in the temp file's place makes staging fail.
        fs::create_dir(storage.temp_path()).unwrap();
        let result = storage.set_many(&[("access_token", "a2"), ("user", "bob")]);

        assert!(result.is_err());
        assert_eq!(storage.get("access_token").unwrap(), Some("a1".to_string()));
        assert_eq!(storage.get("user").unwrap(), Some("alice".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_permissions_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        FileStorage::new(&path).set("access_token", "abc").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
