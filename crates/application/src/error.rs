//! Application error types

use thiserror::Error;

use apiary_domain::DomainError;

use crate::ports::{HttpClientError, StorageError};

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// A request failed validation and was never sent.
    #[error("{0}")]
    Validation(String),

    /// An HTTP request failed for a non-transport reason.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpClientError),

    /// A storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A run for this suite is already in flight.
    #[error("suite is already running: {0}")]
    SuiteAlreadyRunning(String),
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
