//! Request specification type

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use super::{Header, Headers, HttpMethod, QueryParam, QueryParams, RequestBody};
use crate::auth::AuthConfig;

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Complete specification for an HTTP request.
///
/// The editor mutates a spec in place; sending takes an immutable,
/// variable-resolved copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSpec {
    /// Unique identifier for this request
    pub id: Uuid,
    /// Human-readable name
    pub name: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Target URL (may contain variable placeholders)
    pub url: String,
    /// HTTP headers
    #[serde(default)]
    pub headers: Headers,
    /// Query parameters appended to the URL
    #[serde(default)]
    pub query_params: QueryParams,
    /// Request body
    #[serde(default)]
    pub body: RequestBody,
    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl RequestSpec {
    /// Creates a new request specification with default values.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            method: HttpMethod::default(),
            url: String::new(),
            headers: Headers::new(),
            query_params: QueryParams::new(),
            body: RequestBody::none(),
            auth: AuthConfig::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Creates a GET request with the given URL.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        let mut spec = Self::new("New Request");
        spec.method = HttpMethod::Get;
        spec.url = url.into();
        spec
    }

    /// Creates a POST request with the given URL.
    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        let mut spec = Self::new("New Request");
        spec.method = HttpMethod::Post;
        spec.url = url.into();
        spec
    }

    /// Adds a header (builder style).
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(Header::new(name, value));
        self
    }

    /// Adds a query parameter (builder style).
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.add(QueryParam::new(key, value));
        self
    }

    /// Sets the name (builder style).
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Validates the URL and returns the parsed version if valid.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed.
    pub fn parse_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.url)
    }

    /// Returns true if the URL contains variable placeholders.
    #[must_use]
    pub fn has_placeholders(&self) -> bool {
        (self.url.contains("{{") && self.url.contains("}}")) || self.url.contains("${")
    }
}

impl Default for RequestSpec {
    fn default() -> Self {
        Self::new("New Request")
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request() {
        let req = RequestSpec::new("Test Request");
        assert_eq!(req.name, "Test Request");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn test_get_request() {
        let req = RequestSpec::get("https://api.example.com/users");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://api.example.com/users");
    }

    #[test]
    fn test_has_placeholders() {
        let mut req = RequestSpec::new("Test");
        req.url = "https://{{host}}/api/{{version}}/users".to_string();
        assert!(req.has_placeholders());

        req.url = "https://${host}/api".to_string();
        assert!(req.has_placeholders());

        req.url = "https://api.example.com/users".to_string();
        assert!(!req.has_placeholders());
    }

    #[test]
    fn test_timeout_default_on_deserialize() {
        let json = r#"{"id":"0192d3a0-0000-7000-8000-000000000000","name":"t","method":"GET","url":"https://example.com"}"#;
        let spec: RequestSpec = serde_json::from_str(json).expect("should deserialize");
        assert_eq!(spec.timeout_ms, DEFAULT_TIMEOUT_MS);
    }
}
