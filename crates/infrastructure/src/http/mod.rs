//! HTTP infrastructure utilities.
//!
//! This module provides request preparation: turning a resolved request
//! spec into the final URL, header list, and body string to dispatch.

mod request_builder;

pub use request_builder::{prepare, PreparedRequest, RequestBuildError};
