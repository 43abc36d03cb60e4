//! Credential storage.
//!
//! The access and refresh tokens live in a key/value [`TokenStorage`] under two
//! configurable keys. [`TokenStore`] is an explicit handle around it: callers
//! construct one and pass it where it is needed.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{DecodeError, Principal, TokenClaims, decode_claims};

pub const DEFAULT_ACCESS_KEY: &str = "smart_parking_token";
pub const DEFAULT_REFRESH_KEY: &str = "smart_parking_refresh_token";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("token storage io failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("token storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("token storage lock poisoned")]
    Poisoned,
}

/// Durable string key/value storage for credentials.
pub trait TokenStorage: Send + Sync + core::fmt::Debug {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local storage; contents die with the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// JSON object file on disk (the native counterpart of browser local storage).
///
/// Writes go to a sibling temp file that is renamed over the target.
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

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut entries = self.read_all()?;
        f(&mut entries);
        self.write_all(&entries)
    }
}

impl TokenStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

/// Storage keys of the two credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenKeys {
    pub access: String,
    pub refresh: String,
}

impl Default for TokenKeys {
    fn default() -> Self {
        Self {
            access: DEFAULT_ACCESS_KEY.to_string(),
            refresh: DEFAULT_REFRESH_KEY.to_string(),
        }
    }
}

/// Handle over the stored credentials. Cheap to clone; clones share storage.
#[derive(Debug, Clone)]
pub struct TokenStore {
    storage: Arc<dyn TokenStorage>,
    keys: TokenKeys,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn TokenStorage>, keys: TokenKeys) -> Self {
        Self { storage, keys }
    }

    /// In-memory store under the default keys.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()), TokenKeys::default())
    }

    pub fn keys(&self) -> &TokenKeys {
        &self.keys
    }

    /// Persist both credentials. No format validation.
    pub fn save(&self, access: &str, refresh: &str) -> Result<(), StorageError> {
        self.save_access(access)?;
        self.save_refresh(refresh)
    }

    pub fn save_access(&self, access: &str) -> Result<(), StorageError> {
        self.storage.set(&self.keys.access, access)
    }

    pub fn save_refresh(&self, refresh: &str) -> Result<(), StorageError> {
        self.storage.set(&self.keys.refresh, refresh)
    }

    pub fn try_get(&self) -> Result<Option<String>, StorageError> {
        self.storage.get(&self.keys.access)
    }

    pub fn try_get_refresh(&self) -> Result<Option<String>, StorageError> {
        self.storage.get(&self.keys.refresh)
    }

    /// Stored access token; unreadable storage counts as absent.
    pub fn get(&self) -> Option<String> {
        self.try_get().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read access token");
            None
        })
    }

    /// Stored refresh token; unreadable storage counts as absent.
    pub fn get_refresh(&self) -> Option<String> {
        self.try_get_refresh().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read refresh token");
            None
        })
    }

    pub fn remove_access(&self) -> Result<(), StorageError> {
        self.storage.remove(&self.keys.access)
    }

    pub fn remove_refresh(&self) -> Result<(), StorageError> {
        self.storage.remove(&self.keys.refresh)
    }

    /// Remove both credentials (logout, failed 401 recovery).
    pub fn clear(&self) -> Result<(), StorageError> {
        self.remove_access()?;
        self.remove_refresh()
    }

    pub fn has_credential(&self) -> bool {
        self.get().is_some()
    }

    pub fn decode(token: &str) -> Result<TokenClaims, DecodeError> {
        decode_claims(token)
    }

    /// Claims of the stored access token. Decode failures count as absent.
    pub fn claims(&self) -> Option<TokenClaims> {
        let token = self.get()?;
        match decode_claims(&token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::debug!(error = %e, "stored access token does not decode");
                None
            }
        }
    }

    pub fn principal(&self) -> Option<Principal> {
        self.claims().map(Principal::from_claims)
    }

    /// Absent or undecodable credentials count as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.claims().is_none_or(|claims| claims.is_expired_at(now))
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_authenticated_at(&self, now: DateTime<Utc>) -> bool {
        self.has_credential() && !self.is_expired_at(now)
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(Utc::now())
    }
}
