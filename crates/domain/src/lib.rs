//! Apiary Domain - Core business types
//!
//! This crate defines the domain model for the Apiary API client core.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod environment;
pub mod error;
pub mod history;
pub mod id;
pub mod request;
pub mod response;
pub mod suite;

pub use error::{DomainError, DomainResult};
pub use history::{HistoryEntry, RequestHistory};
pub use id::generate_id;
