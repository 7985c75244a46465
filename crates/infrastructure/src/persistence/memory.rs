//! In-memory key-value store.
//!
//! Useful for tests and ephemeral sessions where nothing should touch
//! the filesystem.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use apiary_application::ports::{KeyValueStore, StorageError};

/// `KeyValueStore` adapter holding records in a mutex-guarded map.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: Mutex<HashMap<String, serde_json::Value>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        #[allow(clippy::unwrap_used)] // poisoned only if a writer panicked
        self.records.lock().unwrap().len()
    }

    /// Returns true if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        #[allow(clippy::unwrap_used)] // poisoned only if a writer panicked
        let records = self.records.lock().unwrap();
        Ok(records.get(key).cloned())
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StorageError> {
        #[allow(clippy::unwrap_used)] // poisoned only if a writer panicked
        let mut records = self.records.lock().unwrap();
        records.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        #[allow(clippy::unwrap_used)] // poisoned only if a writer panicked
        let mut records = self.records.lock().unwrap();
        records.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_round_trip() {
        let store = InMemoryStore::new();

        store.set("key", json!({"n": 1})).await.unwrap();
        assert_eq!(store.get("key").await.unwrap(), Some(json!({"n": 1})));
        assert_eq!(store.len(), 1);

        store.remove("key").await.unwrap();
        assert!(store.get("key").await.unwrap().is_none());
        assert!(store.is_empty());
    }
}
