//! Persistence port
//!
//! A single durable key-value capability injected into the environment
//! manager, history log, and suite store. Records are plain JSON
//! documents keyed by fixed string identifiers.

use async_trait::async_trait;
use thiserror::Error;

/// Errors produced by a storage adapter.
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Any other storage failure.
    #[error("{0}")]
    Other(String),
}

/// Port for durable key-value persistence.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the JSON document stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the record exists but cannot be read or parsed.
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError>;

    /// Writes a JSON document under `key`, replacing any existing record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StorageError>;

    /// Deletes the record stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be deleted.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Fixed storage keys used by the application services.
pub(crate) mod keys {
    /// Environments plus the active-environment pointer.
    pub const ENVIRONMENTS: &str = "environments";
    /// Global-tier variables.
    pub const GLOBAL_VARIABLES: &str = "global_variables";
    /// Environment templates.
    pub const ENVIRONMENT_TEMPLATES: &str = "environment_templates";
    /// Request history.
    pub const HISTORY: &str = "history";
    /// Batch suites.
    pub const SUITES: &str = "suites";
    /// Stored batch results.
    pub const SUITE_RESULTS: &str = "suite_results";
}
