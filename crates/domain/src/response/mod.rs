//! HTTP Response domain types

mod cookie;
mod spec;

pub use cookie::Cookie;
pub use spec::{ParsedBody, ResponseSpec, StatusCode, NETWORK_ERROR_STATUS_TEXT};
