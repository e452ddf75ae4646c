use crate::error::ConfigError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

const TRAKT_ACCESS_TOKEN: &str = "trakt_access_token";
const TRAKT_REFRESH_TOKEN: &str = "trakt_refresh_token";
const TRAKT_TOKEN_EXPIRES: &str = "trakt_token_expires";

/// String key-value persistence for auth state.
///
/// Implementations synchronise internally so a store can be shared behind
/// an `Arc` between the auth provider and the commands that log in or out.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError>;

    fn remove(&self, key: &str) -> Result<(), ConfigError>;

    fn keys(&self) -> Vec<String>;

    fn trakt_access_token(&self) -> Option<String> {
        self.get(TRAKT_ACCESS_TOKEN)
    }

    fn set_trakt_access_token(&self, token: &str) -> Result<(), ConfigError> {
        self.set(TRAKT_ACCESS_TOKEN, token)
    }

    fn trakt_refresh_token(&self) -> Option<String> {
        self.get(TRAKT_REFRESH_TOKEN)
    }

    fn set_trakt_refresh_token(&self, token: &str) -> Result<(), ConfigError> {
        self.set(TRAKT_REFRESH_TOKEN, token)
    }

    fn trakt_token_expires(&self) -> Option<DateTime<Utc>> {
        self.get(TRAKT_TOKEN_EXPIRES)
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn set_trakt_token_expires(&self, expires: DateTime<Utc>) -> Result<(), ConfigError> {
        self.set(TRAKT_TOKEN_EXPIRES, &expires.to_rfc3339())
    }

    fn clear_trakt_tokens(&self) -> Result<(), ConfigError> {
        self.remove(TRAKT_ACCESS_TOKEN)?;
        self.remove(TRAKT_REFRESH_TOKEN)?;
        self.remove(TRAKT_TOKEN_EXPIRES)
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct CredentialsData {
    #[serde(flatten)]
    data: BTreeMap<String, String>,
}

/// TOML-backed store; every write is flushed to disk.
pub struct FileStore {
    path: PathBuf,
    credentials: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, loading it if the file exists.
    pub fn open(path: PathBuf) -> Result<Self, ConfigError> {
        let credentials = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let creds_data: CredentialsData = toml::from_str(&content)?;
            creds_data.data
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            credentials: Mutex::new(credentials),
        })
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.credentials
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn save(&self, credentials: &BTreeMap<String, String>) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let creds_data = CredentialsData {
            data: credentials.clone(),
        };
        let content = toml::to_string_pretty(&creds_data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut credentials = self.lock();
        let mut updated = credentials.clone();
        updated.insert(key.to_string(), value.to_string());
        // Memory only changes once the file has been written
        self.save(&updated)?;
        *credentials = updated;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ConfigError> {
        let mut credentials = self.lock();
        if !credentials.contains_key(key) {
            return Ok(());
        }
        let mut updated = credentials.clone();
        updated.remove(key);
        self.save(&updated)?;
        *credentials = updated;
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }
}

/// Process-local store, used in tests and for one-off sessions.
#[derive(Default)]
pub struct MemoryStore {
    credentials: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.credentials
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ConfigError> {
        self.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }
}
