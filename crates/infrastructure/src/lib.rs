//! Apiary Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer.

pub mod adapters;
pub mod http;
pub mod persistence;
pub mod serialization;

pub use adapters::ReqwestHttpClient;
pub use http::{prepare, PreparedRequest, RequestBuildError};
pub use persistence::{InMemoryStore, JsonFileStore};
pub use serialization::{
    from_json, from_json_bytes, to_json_stable, to_json_stable_bytes, SerializationError,
};
