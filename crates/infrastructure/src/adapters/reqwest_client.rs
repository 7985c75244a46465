//! HTTP Client implementation using reqwest.
//!
//! This adapter implements the `HttpClient` port using the reqwest
//! library. It handles all HTTP communication for the application.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::{header, Client, Method, Url};
use tracing::debug;

use apiary_application::ports::{HttpClient, HttpClientError};
use apiary_domain::request::{HttpMethod, RequestSpec};
use apiary_domain::response::{Cookie, ResponseSpec};

use crate::http::prepare;

/// HTTP client implementation using reqwest.
///
/// This is the primary HTTP adapter for Apiary. It wraps
/// `reqwest::Client` and implements the `HttpClient` port from the
/// application layer.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Creates a new HTTP client with default settings.
    ///
    /// Default configuration:
    /// - Follow redirects: up to 10
    /// - TLS verification: enabled
    /// - User-Agent: "Apiary/0.1.0"
    ///
    /// Timeouts are per-request, taken from each spec.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new() -> Result<Self, HttpClientError> {
        let client = Client::builder()
            .user_agent("Apiary/0.1.0")
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| HttpClientError::Other(e.to_string()))?;

        Ok(Self { client })
    }

    /// Creates a new HTTP client with a custom reqwest client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Options => Method::OPTIONS,
        }
    }

    /// Maps reqwest errors to the port's `HttpClientError`.
    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> HttpClientError {
        let host = error
            .url()
            .and_then(Url::host_str)
            .unwrap_or("unknown")
            .to_string();

        if error.is_timeout() {
            return HttpClientError::Timeout { timeout_ms };
        }

        if error.is_connect() {
            let message = error.to_string();
            let lowered = message.to_lowercase();
            if lowered.contains("dns") || lowered.contains("resolve") {
                return HttpClientError::Dns { host };
            }
            if lowered.contains("refused") {
                return HttpClientError::ConnectionRefused { host };
            }
            return HttpClientError::ConnectionFailed(message);
        }

        HttpClientError::Other(error.to_string())
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: &RequestSpec) -> Result<ResponseSpec, HttpClientError> {
        let prepared = prepare(request).map_err(|e| HttpClientError::Other(e.to_string()))?;
        let timeout_ms = request.timeout_ms;

        let parsed_url = Url::parse(&prepared.url)
            .map_err(|e| HttpClientError::InvalidUrl(format!("{e}: {}", prepared.url)))?;

        debug!(method = %prepared.method, url = %parsed_url, "sending request");
        let start = Instant::now();

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(prepared.method), parsed_url)
            .timeout(prepared.timeout);

        for (name, value) in &prepared.headers {
            builder = builder.header(name, value);
        }

        if let Some(body) = prepared.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, timeout_ms))?;

        let duration = start.elapsed();
        let status = response.status().as_u16();
        let status_text = response
            .status()
            .canonical_reason()
            .unwrap_or_default()
            .to_string();

        let mut headers = HashMap::new();
        let mut cookies = Vec::new();
        for (name, value) in response.headers() {
            let value = value.to_str().unwrap_or("<binary>");
            if name == header::SET_COOKIE
                && let Some(cookie) = Cookie::parse(value)
            {
                cookies.push(cookie);
            }
            headers.insert(name.to_string(), value.to_string());
        }

        let body_bytes = response
            .bytes()
            .await
            .map_err(|e| HttpClientError::Other(format!("failed to read body: {e}")))?
            .to_vec();

        Ok(
            ResponseSpec::new(status, status_text, headers, body_bytes, duration)
                .with_cookies(cookies),
        )
    }
}
