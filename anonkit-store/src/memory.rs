//! In-memory storage backend.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::{KeyValueStore, StoreError, StoreResult};

/// In-memory key-value backend backed by a `HashMap`.
///
/// Nothing survives process exit. Intended for tests and for hosts with no
/// persistent storage at all; on such hosts every launch is a fresh install.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates a new empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().map_or(0, |map| map.len())
    }

    /// Returns `true` if no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes all entries (useful for test isolation).
    pub fn clear(&self) {
        if let Ok(mut map) = self.entries.write() {
            map.clear();
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let map = self
            .entries
            .read()
            .map_err(|_| StoreError::unavailable("memory store lock poisoned"))?;
        Ok(map.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut map = self
            .entries
            .write()
            .map_err(|_| StoreError::unavailable("memory store lock poisoned"))?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut map = self
            .entries
            .write()
            .map_err(|_| StoreError::unavailable("memory store lock poisoned"))?;
        map.remove(key);
        Ok(())
    }
}
