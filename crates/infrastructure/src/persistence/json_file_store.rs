//! File-backed key-value store.
//!
//! Stores each key as one JSON document in the platform-specific config
//! directory:
//! - Linux/macOS: ~/.config/apiary/<key>.json
//! - Windows: %APPDATA%/apiary/<key>.json

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use apiary_application::ports::{KeyValueStore, StorageError};

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

/// `KeyValueStore` adapter writing one pretty-printed JSON file per key.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Creates a store rooted at the given directory.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Creates a store at the platform config location.
    ///
    /// # Errors
    ///
    /// Returns an error when no config directory can be determined.
    pub fn at_default_location() -> Result<Self, StorageError> {
        dirs::config_dir()
            .map(|dir| Self::new(dir.join("apiary")))
            .ok_or_else(|| StorageError::Other("could not determine config directory".to_string()))
    }

    /// Returns the directory this store writes into.
    #[must_use]
    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read(&path).await?;
        let value = from_json_bytes(&content)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Some(value))
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).await?;

        let content = to_json_stable_bytes(&value)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let path = self.path_for(key);
        debug!(?path, "writing record");
        fs::write(&path, content).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> (tempfile::TempDir, JsonFileStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("apiary"));
        (dir, store)
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let (_dir, store) = store();
        let value = store.get("missing").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_set_then_get_round_trips() {
        let (_dir, store) = store();
        let value = json!({"environments": [], "active_id": null});

        store.set("environments", value.clone()).await.unwrap();
        let restored = store.get("environments").await.unwrap();
        assert_eq!(restored, Some(value));
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let (_dir, store) = store();

        store.set("history", json!([1, 2])).await.unwrap();
        store.set("history", json!([3])).await.unwrap();

        assert_eq!(store.get("history").await.unwrap(), Some(json!([3])));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let (_dir, store) = store();

        store.set("suites", json!([])).await.unwrap();
        store.remove("suites").await.unwrap();
        store.remove("suites").await.unwrap();

        assert!(store.get("suites").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_files_are_stable_json() {
        let (_dir, store) = store();
        store.set("record", json!({"a": 1})).await.unwrap();

        let content = tokio::fs::read_to_string(store.path_for("record"))
            .await
            .unwrap();
        assert!(content.ends_with('\n'));
        assert!(content.contains("  \"a\""));
    }
}
