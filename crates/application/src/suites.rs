//! Suite store
//!
//! CRUD for batch suites and their stored run results, persisted through
//! the storage port under fixed keys.

use std::sync::RwLock;

use chrono::{DateTime, Utc};

use apiary_domain::request::RequestSpec;
use apiary_domain::suite::{BatchResult, Suite, SuiteSettings, SuiteStatus};

use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::storage::keys;
use crate::ports::KeyValueStore;

#[derive(Debug, Default)]
struct SuiteState {
    suites: Vec<Suite>,
    results: Vec<BatchResult>,
}

/// Persisted collection of suites and their run results.
pub struct SuiteStore<S> {
    store: S,
    state: RwLock<SuiteState>,
}

impl<S: KeyValueStore> SuiteStore<S> {
    /// Creates an empty store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: RwLock::new(SuiteState::default()),
        }
    }

    /// Creates a store and restores persisted suites and results.
    ///
    /// Suites persisted mid-run are normalized back to idle: a `Running`
    /// status cannot survive a restart.
    ///
    /// # Errors
    ///
    /// Returns an error if a persisted record exists but cannot be read.
    pub async fn load(store: S) -> ApplicationResult<Self> {
        let mut suites: Vec<Suite> = match store.get(keys::SUITES).await? {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| ApplicationError::Validation(format!("corrupt suites: {e}")))?,
            None => Vec::new(),
        };
        for suite in &mut suites {
            if suite.status == SuiteStatus::Running {
                suite.status = SuiteStatus::Idle;
            }
        }

        let results: Vec<BatchResult> = match store.get(keys::SUITE_RESULTS).await? {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| ApplicationError::Validation(format!("corrupt suite results: {e}")))?,
            None => Vec::new(),
        };

        Ok(Self {
            store,
            state: RwLock::new(SuiteState { suites, results }),
        })
    }

    /// Creates a new suite.
    ///
    /// # Errors
    ///
    /// Returns an error if the new state cannot be persisted.
    pub async fn create(
        &self,
        name: impl Into<String>,
        requests: Vec<RequestSpec>,
        settings: SuiteSettings,
    ) -> ApplicationResult<Suite> {
        let mut suite = Suite::new(name).with_settings(settings);
        suite.requests = requests;

        self.write(|state| state.suites.push(suite.clone()));
        self.persist_suites().await?;
        Ok(suite)
    }

    /// Returns a snapshot of a suite by id.
    pub fn get(&self, id: &str) -> Option<Suite> {
        self.read(|state| state.suites.iter().find(|s| s.id == id).cloned())
    }

    /// Returns a snapshot of all suites.
    pub fn list(&self) -> Vec<Suite> {
        self.read(|state| state.suites.clone())
    }

    /// Deletes a suite and its stored results.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids.
    pub async fn delete(&self, id: &str) -> ApplicationResult<()> {
        let found = self.write(|state| {
            let Some(index) = state.suites.iter().position(|s| s.id == id) else {
                return false;
            };
            state.suites.remove(index);
            state.results.retain(|r| r.suite_id != id);
            true
        });

        if !found {
            return Err(ApplicationError::NotFound(format!("suite {id}")));
        }

        self.persist_suites().await?;
        self.persist_results().await
    }

    /// Duplicates a suite under a derived name. The copy starts idle
    /// with no run statistics.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids.
    pub async fn duplicate(&self, id: &str) -> ApplicationResult<Suite> {
        let duplicated = self.write(|state| {
            let original = state.suites.iter().find(|s| s.id == id)?;
            let mut copy = Suite::new(format!("{} (copy)", original.name))
                .with_settings(original.settings.clone());
            copy.requests = original.requests.clone();
            state.suites.push(copy.clone());
            Some(copy)
        });

        let Some(suite) = duplicated else {
            return Err(ApplicationError::NotFound(format!("suite {id}")));
        };

        self.persist_suites().await?;
        Ok(suite)
    }

    /// Returns stored results for a suite, newest first.
    pub fn results(&self, suite_id: &str) -> Vec<BatchResult> {
        self.read(|state| {
            state
                .results
                .iter()
                .filter(|r| r.suite_id == suite_id)
                .cloned()
                .collect()
        })
    }

    /// Updates a suite's lifecycle status.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids.
    pub(crate) async fn set_status(
        &self,
        id: &str,
        status: SuiteStatus,
    ) -> ApplicationResult<()> {
        let found = self.write(|state| {
            let Some(suite) = state.suites.iter_mut().find(|s| s.id == id) else {
                return false;
            };
            suite.status = status;
            suite.updated_at = Utc::now();
            true
        });

        if !found {
            return Err(ApplicationError::NotFound(format!("suite {id}")));
        }

        self.persist_suites().await
    }

    /// Records a run's terminal state on the suite.
    pub(crate) async fn finish_run(
        &self,
        id: &str,
        status: SuiteStatus,
        finished_at: DateTime<Utc>,
        success_rate: f64,
    ) -> ApplicationResult<()> {
        let found = self.write(|state| {
            let Some(suite) = state.suites.iter_mut().find(|s| s.id == id) else {
                return false;
            };
            suite.status = status;
            suite.last_run_at = Some(finished_at);
            suite.success_rate = Some(success_rate);
            suite.updated_at = Utc::now();
            true
        });

        if !found {
            return Err(ApplicationError::NotFound(format!("suite {id}")));
        }

        self.persist_suites().await
    }

    /// Stores a finished run's result (newest first).
    pub(crate) async fn record_result(&self, result: BatchResult) -> ApplicationResult<()> {
        self.write(|state| state.results.insert(0, result));
        self.persist_results().await
    }

    fn read<T>(&self, f: impl FnOnce(&SuiteState) -> T) -> T {
        #[allow(clippy::unwrap_used)] // poisoned only if a writer panicked
        let state = self.state.read().unwrap();
        f(&state)
    }

    fn write<T>(&self, f: impl FnOnce(&mut SuiteState) -> T) -> T {
        #[allow(clippy::unwrap_used)] // poisoned only if a writer panicked
        let mut state = self.state.write().unwrap();
        f(&mut state)
    }

    async fn persist_suites(&self) -> ApplicationResult<()> {
        let suites = self.read(|state| state.suites.clone());
        let value = serde_json::to_value(suites).unwrap_or(serde_json::Value::Null);
        self.store.set(keys::SUITES, value).await?;
        Ok(())
    }

    async fn persist_results(&self) -> ApplicationResult<()> {
        let results = self.read(|state| state.results.clone());
        let value = serde_json::to_value(results).unwrap_or(serde_json::Value::Null);
        self.store.set(keys::SUITE_RESULTS, value).await?;
        Ok(())
    }
}
