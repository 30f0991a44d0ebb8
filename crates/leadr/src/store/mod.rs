//! Credential persistence.
//!
//! [`TokenStore`] is the only component that reads or writes credentials. It
//! sits on top of a [`KeyValueStore`], which can be the in-process
//! [`MemoryStore`], the on-disk [`FileStore`], or anything else that can get
//! and set strings.

mod file;
mod fingerprint;
mod tokens;

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::error::StoreError;

pub use file::FileStore;
pub use fingerprint::{DeviceFingerprint, FingerprintSource};
pub use tokens::{StoredCredentials, TokenStore};

/// Durable string key/value storage.
///
/// Implementations must not tear writes: a concurrent reader sees either the
/// old value or the new one.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Non-durable store backed by a map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}
