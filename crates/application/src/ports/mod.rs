//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external
//! systems. Each port is a trait implemented by adapters in the
//! infrastructure layer (or by mocks in tests).

mod cancellation;
mod http_client;
pub(crate) mod storage;

pub use cancellation::{CancellationReceiver, CancellationToken};
pub use http_client::{HttpClient, HttpClientError};
pub use storage::{KeyValueStore, StorageError};
