//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: the
//! API base URL, request timeout, where the session is persisted, and the
//! last phone number used to log in.
//!
//! Configuration is stored at `~/.config/bookadmin/config.json`. The base
//! URL can be overridden with `BOOKADMIN_API_BASE_URL`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::api::{DEFAULT_API_BASE_URL, REQUEST_TIMEOUT_SECS};
use crate::auth::{FileStorage, KeyringStorage, SessionStorage};

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "bookadmin";

/// Environment variable overriding the API base URL
pub const BASE_URL_ENV: &str = "BOOKADMIN_API_BASE_URL";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Where the persisted session lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// `session.json` in the cache directory
    #[default]
    File,
    /// OS keychain
    Keyring,
}

impl StorageBackend {
    /// Open this backend; `cache_dir` is only used by `File`
    pub fn open(self, cache_dir: &Path) -> Arc<dyn SessionStorage> {
        match self {
            StorageBackend::File => Arc::new(FileStorage::in_dir(cache_dir)),
            StorageBackend::Keyring => Arc::new(KeyringStorage::new()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub storage: StorageBackend,
    #[serde(default)]
    pub last_phone_number: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Base URL: environment, then config file, then the default
    pub fn api_base_url(&self) -> String {
        self.resolve_base_url(std::env::var(BASE_URL_ENV).ok())
    }

    fn resolve_base_url(&self, env: Option<String>) -> String {
        env.into_iter()
            .chain(self.api_base_url.clone())
            .map(|url| url.trim().to_string())
            .find(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(REQUEST_TIMEOUT_SECS),
        )
    }

    /// Open the configured session storage backend
    pub fn session_storage(&self) -> Result<Arc<dyn SessionStorage>> {
        let cache_dir = match self.storage {
            StorageBackend::File => self.cache_dir()?,
            StorageBackend::Keyring => PathBuf::new(),
        };
        Ok(self.storage.open(&cache_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_resolution_order() {
        let mut config = Config::default();
        assert_eq!(config.resolve_base_url(None), DEFAULT_API_BASE_URL);

        config.api_base_url = Some("https://file.example.test/api".to_string());
        assert_eq!(config.resolve_base_url(None), "https://file.example.test/api");

        assert_eq!(
            config.resolve_base_url(Some("https://env.example.test".to_string())),
            "https://env.example.test"
        );

        // Blank values fall through
        assert_eq!(
            config.resolve_base_url(Some("  ".to_string())),
            "https://file.example.test/api"
        );
    }

    #[test]
    fn test_request_timeout() {
        let mut config = Config::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(REQUEST_TIMEOUT_SECS));
        config.request_timeout_secs = Some(5);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        config.request_timeout_secs = Some(0);
        assert_eq!(config.request_timeout(), Duration::from_secs(REQUEST_TIMEOUT_SECS));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("bookadmin").join(CONFIG_FILE);

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.storage, StorageBackend::File);
        assert!(loaded.api_base_url.is_none());

        let config = Config {
            api_base_url: Some("https://api.example.test".to_string()),
            request_timeout_secs: Some(10),
            storage: StorageBackend::Keyring,
            last_phone_number: Some("9990001111".to_string()),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_base_url.as_deref(), Some("https://api.example.test"));
        assert_eq!(loaded.storage, StorageBackend::Keyring);
        assert_eq!(loaded.last_phone_number.as_deref(), Some("9990001111"));
    }

    #[test]
    fn test_partial_config_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "storage": "keyring" }"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.storage, StorageBackend::Keyring);
        assert!(loaded.request_timeout_secs.is_none());
    }

    #[test]
    fn test_storage_backend_selection() {
        use crate::auth::TOKEN_KEY;

        crate::api::testing::use_mock_keychain();
        let temp_dir = tempfile::tempdir().unwrap();
        let session_file = temp_dir.path().join(crate::auth::storage::SESSION_FILE);

        let storage = StorageBackend::Keyring.open(temp_dir.path());
        storage.set(TOKEN_KEY, "tok").unwrap();
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("tok"));
        assert!(!session_file.exists());
        storage.remove(TOKEN_KEY).unwrap();

        let storage = StorageBackend::File.open(temp_dir.path());
        storage.set(TOKEN_KEY, "tok").unwrap();
        assert!(session_file.exists());
    }
}
