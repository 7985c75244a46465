//! Apiary Application - Use cases and ports
//!
//! This crate defines the application layer with:
//! - Port traits (interfaces for external dependencies)
//! - The variable resolution engine
//! - Use case orchestration: sending requests, running suites,
//!   managing environments and history
//! - Application-level error handling

pub mod batch;
pub mod environments;
pub mod error;
pub mod history;
pub mod ports;
pub mod resolver;
pub mod send_request;
pub mod suites;

pub use batch::BatchRunner;
pub use environments::EnvironmentManager;
pub use error::{ApplicationError, ApplicationResult};
pub use history::HistoryLog;
pub use ports::{
    CancellationReceiver, CancellationToken, HttpClient, HttpClientError, KeyValueStore,
    StorageError,
};
pub use resolver::{
    ReferenceValidation, RequestResolution, ResolutionContext, ResolutionResult, VariableResolver,
};
pub use send_request::SendRequest;
pub use suites::SuiteStore;
