//! Response specification type
//!
//! Contains types for representing HTTP responses including
//! status codes, headers, parsed body, and timing information.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::cookie::Cookie;

/// Status text used for transport-level failures.
pub const NETWORK_ERROR_STATUS_TEXT: &str = "Network Error";

/// HTTP status code with semantic helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusCode(pub u16);

impl StatusCode {
    /// Creates a new `StatusCode`.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric status code.
    #[must_use]
    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns true if this is a 2xx success status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Returns true if this is a 4xx client error status.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }

    /// Returns true if this is a 5xx server error status.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.0 >= 500 && self.0 < 600
    }

    /// Returns the canonical reason phrase for common status codes.
    #[must_use]
    pub const fn reason_phrase(&self) -> &'static str {
        match self.0 {
            100 => "Continue",
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            204 => "No Content",
            301 => "Moved Permanently",
            302 => "Found",
            304 => "Not Modified",
            307 => "Temporary Redirect",
            308 => "Permanent Redirect",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            408 => "Request Timeout",
            409 => "Conflict",
            422 => "Unprocessable Entity",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            _ => "Unknown",
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

/// The response payload, parsed JSON-first with text fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ParsedBody {
    /// The payload parsed as a JSON document.
    Json(serde_json::Value),
    /// The payload as raw text (non-JSON or invalid JSON).
    Text(String),
}

impl ParsedBody {
    /// Parses raw payload bytes, falling back to lossy text.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        serde_json::from_slice(bytes).map_or_else(
            |_| Self::Text(String::from_utf8_lossy(bytes).into_owned()),
            Self::Json,
        )
    }

    /// Returns the JSON value if the body parsed as JSON.
    #[must_use]
    pub const fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// Returns the text if the body did not parse as JSON.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Json(_) => None,
            Self::Text(text) => Some(text),
        }
    }
}

impl Default for ParsedBody {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

/// HTTP response specification.
///
/// Produced exactly once per send attempt. A `status` of `0` together
/// with the "Network Error" status text marks a transport failure, as
/// opposed to a valid HTTP error status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSpec {
    /// HTTP status code (0 for transport failures).
    pub status: u16,
    /// Status text (e.g., "OK", "Not Found", "Network Error").
    pub status_text: String,
    /// Response headers.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Parsed response payload.
    pub data: ParsedBody,
    /// Response time.
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    /// Byte length of the raw response payload.
    pub size: usize,
    /// Cookies parsed from `Set-Cookie` headers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cookies: Vec<Cookie>,
}

impl ResponseSpec {
    /// Creates a new `ResponseSpec` from raw response data.
    #[must_use]
    pub fn new(
        status: impl Into<StatusCode>,
        status_text: impl Into<String>,
        headers: HashMap<String, String>,
        body: Vec<u8>,
        duration: Duration,
    ) -> Self {
        let status_code = status.into();
        let status_text = status_text.into();
        let status_text = if status_text.is_empty() {
            status_code.reason_phrase().to_string()
        } else {
            status_text
        };

        Self {
            status: status_code.as_u16(),
            status_text,
            headers,
            data: ParsedBody::from_bytes(&body),
            duration,
            size: body.len(),
            cookies: Vec::new(),
        }
    }

    /// Creates a response record for a transport-level failure.
    ///
    /// DNS failures, refused connections, timeouts and aborts all map
    /// here; the error message is surfaced as the body text.
    #[must_use]
    pub fn network_error(message: impl Into<String>, duration: Duration) -> Self {
        Self {
            status: 0,
            status_text: NETWORK_ERROR_STATUS_TEXT.to_string(),
            headers: HashMap::new(),
            data: ParsedBody::Text(message.into()),
            duration,
            size: 0,
            cookies: Vec::new(),
        }
    }

    /// Attaches parsed cookies (builder style).
    #[must_use]
    pub fn with_cookies(mut self, cookies: Vec<Cookie>) -> Self {
        self.cookies = cookies;
        self
    }

    /// Returns the status as a `StatusCode` struct.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        StatusCode::new(self.status)
    }

    /// Returns true if the status code indicates success (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns true if this record marks a transport failure.
    #[must_use]
    pub const fn is_network_error(&self) -> bool {
        self.status == 0
    }

    /// Gets a header value by name (case-insensitive).
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&String> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Returns a human-readable duration string (e.g., "124 ms").
    #[must_use]
    pub fn duration_display(&self) -> String {
        let millis = self.duration.as_millis();
        if millis < 1000 {
            format!("{millis} ms")
        } else {
            format!("{:.2} s", self.duration.as_secs_f64())
        }
    }

    /// Returns a human-readable size string (e.g., "1.2 KB").
    #[must_use]
    pub fn size_display(&self) -> String {
        format_bytes(self.size)
    }
}

impl Default for ResponseSpec {
    fn default() -> Self {
        Self {
            status: 0,
            status_text: String::new(),
            headers: HashMap::new(),
            data: ParsedBody::default(),
            duration: Duration::ZERO,
            size: 0,
            cookies: Vec::new(),
        }
    }
}

/// Formats bytes into a human-readable string.
fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;
    const GB: usize = MB * 1024;

    #[allow(clippy::cast_precision_loss)]
    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Truncation is acceptable: durations over ~584 million years are not realistic
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_categories() {
        assert!(StatusCode::new(200).is_success());
        assert!(StatusCode::new(201).is_success());
        assert!(StatusCode::new(404).is_client_error());
        assert!(StatusCode::new(500).is_server_error());
        assert!(!StatusCode::new(0).is_success());
    }

    #[test]
    fn test_status_code_display() {
        assert_eq!(StatusCode::new(200).to_string(), "200 OK");
        assert_eq!(StatusCode::new(404).to_string(), "404 Not Found");
    }

    #[test]
    fn test_parsed_body_json() {
        let body = ParsedBody::from_bytes(br#"{"id": 42}"#);
        let json = body.as_json().expect("should parse as JSON");
        assert_eq!(json["id"], 42);
    }

    #[test]
    fn test_parsed_body_text_fallback() {
        let body = ParsedBody::from_bytes(b"plain text, not json");
        assert_eq!(body.as_text(), Some("plain text, not json"));
        assert!(body.as_json().is_none());
    }

    #[test]
    fn test_response_new() {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        let response = ResponseSpec::new(
            200,
            "OK",
            headers,
            br#"{"hello": "world"}"#.to_vec(),
            Duration::from_millis(100),
        );

        assert_eq!(response.status, 200);
        assert_eq!(response.status_text, "OK");
        assert_eq!(response.size, 18);
        assert!(response.is_success());
        assert!(response.data.as_json().is_some());
    }

    #[test]
    fn test_response_reason_phrase_fallback() {
        let response =
            ResponseSpec::new(404, "", HashMap::new(), Vec::new(), Duration::ZERO);
        assert_eq!(response.status_text, "Not Found");
    }

    #[test]
    fn test_network_error() {
        let response =
            ResponseSpec::network_error("connection refused", Duration::from_millis(12));

        assert_eq!(response.status, 0);
        assert_eq!(response.status_text, NETWORK_ERROR_STATUS_TEXT);
        assert_eq!(response.size, 0);
        assert!(response.is_network_error());
        assert!(!response.is_success());
        assert_eq!(response.data.as_text(), Some("connection refused"));
    }

    #[test]
    fn test_get_header_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        let response =
            ResponseSpec::new(200, "OK", headers, Vec::new(), Duration::ZERO);

        assert_eq!(
            response.get_header("content-type"),
            Some(&"application/json".to_string())
        );
        assert_eq!(response.get_header("Missing"), None);
    }

    #[test]
    fn test_duration_display() {
        let response = ResponseSpec {
            duration: Duration::from_millis(150),
            ..Default::default()
        };
        assert_eq!(response.duration_display(), "150 ms");

        let response2 = ResponseSpec {
            duration: Duration::from_millis(1500),
            ..Default::default()
        };
        assert_eq!(response2.duration_display(), "1.50 s");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1_048_576), "1.00 MB");
    }

    #[test]
    fn test_duration_serde_roundtrip() {
        let response = ResponseSpec::new(
            200,
            "OK",
            HashMap::new(),
            b"body".to_vec(),
            Duration::from_millis(250),
        );

        let json = serde_json::to_string(&response).expect("serialize");
        let restored: ResponseSpec = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored.duration, Duration::from_millis(250));
        assert_eq!(restored.size, 4);
    }
}
