//! History log service
//!
//! Wraps the domain history with persistence through the storage port.
//! Every append is written out immediately so a crash never loses more
//! than the in-flight entry.

use std::sync::Mutex;

use tracing::warn;

use apiary_domain::{HistoryEntry, RequestHistory};

use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::storage::keys;
use crate::ports::KeyValueStore;

/// Append-only request history persisted through the storage port.
pub struct HistoryLog<S> {
    store: S,
    history: Mutex<RequestHistory>,
}

impl<S: KeyValueStore> HistoryLog<S> {
    /// Creates an empty log with the given entry cap.
    pub fn new(store: S, max_entries: usize) -> Self {
        Self {
            store,
            history: Mutex::new(RequestHistory::new(max_entries)),
        }
    }

    /// Creates a log and restores persisted entries from the store.
    ///
    /// A missing record yields an empty history with the given cap; a
    /// persisted history larger than the cap is trimmed.
    ///
    /// # Errors
    ///
    /// Returns an error if a persisted record exists but cannot be read.
    pub async fn load(store: S, max_entries: usize) -> ApplicationResult<Self> {
        let mut history: RequestHistory = match store.get(keys::HISTORY).await? {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| ApplicationError::Validation(format!("corrupt history: {e}")))?,
            None => RequestHistory::new(max_entries),
        };
        history.set_max_entries(max_entries);

        Ok(Self {
            store,
            history: Mutex::new(history),
        })
    }

    /// Appends an entry (newest first) and persists the log.
    ///
    /// A storage failure is logged but does not fail the caller; the
    /// entry is still retained in memory.
    pub async fn record(&self, entry: HistoryEntry) {
        let snapshot = {
            #[allow(clippy::unwrap_used)] // poisoned only if a writer panicked
            let mut history = self.history.lock().unwrap();
            history.add(entry);
            history.clone()
        };

        if let Err(error) = self.persist(&snapshot).await {
            warn!(%error, "failed to persist request history");
        }
    }

    /// Returns all entries, newest first.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        #[allow(clippy::unwrap_used)] // poisoned only if a writer panicked
        let history = self.history.lock().unwrap();
        history.entries().iter().cloned().collect()
    }

    /// Returns the number of retained entries.
    pub fn len(&self) -> usize {
        #[allow(clippy::unwrap_used)] // poisoned only if a writer panicked
        self.history.lock().unwrap().len()
    }

    /// Returns true if no entries are retained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes all entries and persists the empty log.
    ///
    /// # Errors
    ///
    /// Returns an error if the empty log cannot be persisted.
    pub async fn clear(&self) -> ApplicationResult<()> {
        let snapshot = {
            #[allow(clippy::unwrap_used)] // poisoned only if a writer panicked
            let mut history = self.history.lock().unwrap();
            history.clear();
            history.clone()
        };
        self.persist(&snapshot).await
    }

    async fn persist(&self, history: &RequestHistory) -> ApplicationResult<()> {
        let value = serde_json::to_value(history).unwrap_or(serde_json::Value::Null);
        self.store.set(keys::HISTORY, value).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    use apiary_domain::request::RequestSpec;
    use apiary_domain::response::ResponseSpec;

    use crate::ports::StorageError;

    #[derive(Default)]
    struct MockStore {
        records: Mutex<HashMap<String, serde_json::Value>>,
    }

    #[async_trait]
    impl KeyValueStore for MockStore {
        async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
            Ok(self.records.lock().expect("lock poisoned").get(key).cloned())
        }

        async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StorageError> {
            self.records
                .lock()
                .expect("lock poisoned")
                .insert(key.to_string(), value);
            Ok(())
        }

        async fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.records.lock().expect("lock poisoned").remove(key);
            Ok(())
        }
    }

    fn entry(url: &str, status: u16) -> HistoryEntry {
        HistoryEntry::completed(
            RequestSpec::get(url),
            ResponseSpec::new(status, "", HashMap::new(), vec![], Duration::from_millis(5)),
        )
    }

    #[tokio::test]
    async fn test_record_and_list_newest_first() {
        let log = HistoryLog::new(MockStore::default(), 10);

        log.record(entry("https://example.com/1", 200)).await;
        log.record(entry("https://example.com/2", 404)).await;

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].request.url.ends_with("/2"));
        assert!(!entries[0].success);
        assert!(entries[1].success);
    }

    #[tokio::test]
    async fn test_cap_is_enforced() {
        let log = HistoryLog::new(MockStore::default(), 3);

        for i in 0..5 {
            log.record(entry(&format!("https://example.com/{i}"), 200))
                .await;
        }

        assert_eq!(log.len(), 3);
        assert!(log.entries()[0].request.url.ends_with("/4"));
    }

    #[tokio::test]
    async fn test_persists_across_reload() {
        let store = MockStore::default();
        let log = HistoryLog::new(store, 10);
        log.record(entry("https://example.com", 200)).await;

        let records = log.store.records.lock().unwrap().clone();
        let reloaded = HistoryLog::load(
            MockStore {
                records: Mutex::new(records),
            },
            10,
        )
        .await
        .unwrap();

        assert_eq!(reloaded.len(), 1);
    }

    #[tokio::test]
    async fn test_reload_trims_to_new_cap() {
        let log = HistoryLog::new(MockStore::default(), 10);
        for i in 0..5 {
            log.record(entry(&format!("https://example.com/{i}"), 200))
                .await;
        }

        let records = log.store.records.lock().unwrap().clone();
        let reloaded = HistoryLog::load(
            MockStore {
                records: Mutex::new(records),
            },
            2,
        )
        .await
        .unwrap();

        assert_eq!(reloaded.len(), 2);
    }

    #[tokio::test]
    async fn test_clear() {
        let log = HistoryLog::new(MockStore::default(), 10);
        log.record(entry("https://example.com", 200)).await;

        log.clear().await.unwrap();
        assert!(log.is_empty());
    }
}
