//! Durable key/value storage for the persisted session.
//!
//! The session is two keys: `TOKEN_KEY` holds the raw bearer token and
//! `USER_KEY` the JSON-serialized identity. Only `SessionStore` writes them.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use keyring::Entry;
use thiserror::Error;
use tracing::warn;

pub const TOKEN_KEY: &str = "admin_token";
pub const USER_KEY: &str = "admin_user";

/// Session file name in cache directory
pub const SESSION_FILE: &str = "session.json";

/// Keychain service name
const SERVICE_NAME: &str = "bookadmin";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session storage is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Keychain access failed: {0}")]
    Keyring(#[from] keyring::Error),
}

pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// ============================================================================
// In-memory
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

// ============================================================================
// JSON file
// ============================================================================

/// All keys in one JSON object file. The file is deleted once empty.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Storage at `<cache_dir>/session.json`
    pub fn in_dir(cache_dir: &Path) -> Self {
        Self::new(cache_dir.join(SESSION_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if map.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path)?;
            }
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = match self.read_map() {
            Ok(map) => map,
            Err(StorageError::Json(e)) => {
                // Nothing in an unreadable file can be trusted
                warn!(path = %self.path.display(), error = %e, "Removing corrupt session file");
                std::fs::remove_file(&self.path)?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

// ============================================================================
// OS keychain
// ============================================================================

/// One keychain entry per key under the `bookadmin` service.
///
/// Entries are opened once per key and reused, so the handle that wrote a
/// value is the one that reads it back.
pub struct KeyringStorage {
    service: String,
    entries: Mutex<HashMap<String, Arc<Entry>>>,
}

impl KeyringStorage {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, key: &str) -> Result<Arc<Entry>, StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get(key) {
            return Ok(Arc::clone(entry));
        }
        let entry = Arc::new(Entry::new(&self.service, key)?);
        entries.insert(key.to_string(), Arc::clone(&entry));
        Ok(entry)
    }
}

impl Default for KeyringStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KeyringStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyringStorage")
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

impl SessionStorage for KeyringStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entry(key)?.set_password(value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);

        storage.set(TOKEN_KEY, "abc").unwrap();
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("abc"));

        storage.remove(TOKEN_KEY).unwrap();
        storage.remove(TOKEN_KEY).unwrap();
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_storage_round_trip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::in_dir(&temp_dir.path().join("nested"));

        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
        assert!(!storage.path().exists());

        storage.set(TOKEN_KEY, "tok").unwrap();
        storage.set(USER_KEY, r#"{"user_id":1}"#).unwrap();
        assert!(storage.path().exists());

        // A second handle on the same file sees the same values
        let reopened = FileStorage::new(storage.path().to_path_buf());
        assert_eq!(reopened.get(TOKEN_KEY).unwrap().as_deref(), Some("tok"));
        assert_eq!(reopened.get(USER_KEY).unwrap().as_deref(), Some(r#"{"user_id":1}"#));
    }

    #[test]
    fn test_file_storage_deletes_file_when_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::in_dir(temp_dir.path());

        storage.set(TOKEN_KEY, "tok").unwrap();
        storage.set(USER_KEY, "{}").unwrap();
        storage.remove(TOKEN_KEY).unwrap();
        assert!(storage.path().exists());
        storage.remove(USER_KEY).unwrap();
        assert!(!storage.path().exists());

        // Removing from a missing file is fine
        storage.remove(USER_KEY).unwrap();
    }

    #[test]
    fn test_file_storage_corrupt_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::in_dir(temp_dir.path());
        std::fs::write(storage.path(), "{ not json").unwrap();

        assert!(matches!(storage.get(TOKEN_KEY), Err(StorageError::Json(_))));

        storage.remove(TOKEN_KEY).unwrap();
        assert!(!storage.path().exists());
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_keyring_storage_round_trip() {
        crate::api::testing::use_mock_keychain();
        let storage = KeyringStorage::with_service("bookadmin-test");

        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
        storage.remove(TOKEN_KEY).unwrap();

        storage.set(TOKEN_KEY, "tok").unwrap();
        storage.set(USER_KEY, r#"{"user_id":1}"#).unwrap();
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("tok"));
        assert_eq!(storage.get(USER_KEY).unwrap().as_deref(), Some(r#"{"user_id":1}"#));

        storage.set(TOKEN_KEY, "tok2").unwrap();
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("tok2"));

        storage.remove(TOKEN_KEY).unwrap();
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(storage.get(USER_KEY).unwrap().as_deref(), Some(r#"{"user_id":1}"#));
    }

    /// Needs a real keychain; run alone with
    /// `cargo test test_keyring_storage_os_keychain -- --ignored`
    #[test]
    #[ignore]
    fn test_keyring_storage_os_keychain() {
        let service = format!("bookadmin-test-{}", std::process::id());
        let writer = KeyringStorage::with_service(service.clone());
        writer.set(TOKEN_KEY, "tok").unwrap();

        let reader = KeyringStorage::with_service(service);
        assert_eq!(reader.get(TOKEN_KEY).unwrap().as_deref(), Some("tok"));

        reader.remove(TOKEN_KEY).unwrap();
        assert_eq!(writer.get(TOKEN_KEY).unwrap(), None);
    }
}
