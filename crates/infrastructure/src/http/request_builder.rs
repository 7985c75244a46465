//! Request preparation
//!
//! Pure construction of the final wire request from a resolved spec:
//! query-parameter encoding, header assembly, Content-Type defaulting,
//! auth application, and body serialization. Kept free of any HTTP
//! client types so it can be tested without a transport.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use thiserror::Error;

use apiary_domain::auth::{ApiKeyLocation, AuthConfig};
use apiary_domain::request::{HttpMethod, RequestBody, RequestSpec};

/// Errors that can occur while preparing a request.
#[derive(Debug, Error)]
pub enum RequestBuildError {
    /// Query or form pairs could not be URL-encoded.
    #[error("failed to encode pairs: {0}")]
    Encoding(#[from] serde_urlencoded::ser::Error),
}

/// The final wire-level request produced from a resolved spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Final URL with all enabled query parameters appended.
    pub url: String,
    /// Header name/value pairs in application order.
    pub headers: Vec<(String, String)>,
    /// Serialized body, for methods that carry one.
    pub body: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Builds the final request from a resolved spec.
///
/// - Enabled query parameters are URL-encoded and appended; an API key
///   configured for the query string is appended alongside them.
/// - Headers come from the enabled pairs; `Content-Type` is defaulted
///   from the body type for POST/PUT/PATCH/DELETE unless already set.
/// - Bearer/Basic/ApiKey auth is applied last, replacing any same-name
///   header.
/// - The body is attached only for methods that allow one: raw and JSON
///   payloads verbatim, form fields URL-encoded.
///
/// # Errors
///
/// Returns an error if query or form pairs cannot be encoded.
pub fn prepare(spec: &RequestSpec) -> Result<PreparedRequest, RequestBuildError> {
    let url = build_url(spec)?;
    let headers = build_headers(spec);
    let body = build_body(spec)?;

    Ok(PreparedRequest {
        method: spec.method,
        url,
        headers,
        body,
        timeout: Duration::from_millis(spec.timeout_ms),
    })
}

fn build_url(spec: &RequestSpec) -> Result<String, RequestBuildError> {
    let mut pairs: Vec<(&str, &str)> = spec
        .query_params
        .enabled()
        .map(|p| (p.key.as_str(), p.value.as_str()))
        .collect();

    // API keys destined for the query string ride along with the params
    if let AuthConfig::ApiKey {
        name,
        value,
        location: ApiKeyLocation::Query,
    } = &spec.auth
        && !name.is_empty()
    {
        pairs.push((name.as_str(), value.as_str()));
    }

    if pairs.is_empty() {
        return Ok(spec.url.clone());
    }

    let query = serde_urlencoded::to_string(&pairs)?;
    let separator = if spec.url.contains('?') { '&' } else { '?' };
    Ok(format!("{}{}{}", spec.url, separator, query))
}

fn build_headers(spec: &RequestSpec) -> Vec<(String, String)> {
    let mut headers: Vec<(String, String)> = spec
        .headers
        .enabled()
        .map(|h| (h.name.clone(), h.value.clone()))
        .collect();

    // Default Content-Type from the body type for mutating methods
    if spec.method.allows_body()
        && !spec.body.is_empty()
        && !spec.headers.contains("content-type")
        && let Some(content_type) = spec.body.content_type()
    {
        headers.push(("Content-Type".to_string(), content_type.to_string()));
    }

    apply_auth(&spec.auth, &mut headers);
    headers
}

fn apply_auth(auth: &AuthConfig, headers: &mut Vec<(String, String)>) {
    match auth {
        AuthConfig::None => {}
        AuthConfig::Bearer { token } => {
            if !token.is_empty() {
                set_header(headers, "Authorization", format!("Bearer {token}"));
            }
        }
        AuthConfig::Basic { username, password } => {
            if !username.is_empty() && !password.is_empty() {
                let credentials = BASE64.encode(format!("{username}:{password}"));
                set_header(headers, "Authorization", format!("Basic {credentials}"));
            }
        }
        AuthConfig::ApiKey {
            name,
            value,
            location: ApiKeyLocation::Header,
        } => {
            if !name.is_empty() {
                set_header(headers, name, value.clone());
            }
        }
        AuthConfig::ApiKey {
            location: ApiKeyLocation::Query,
            ..
        } => {
            // Handled during URL construction
        }
    }
}

/// Sets a header, replacing any existing entry with the same name
/// (case-insensitive).
fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: String) {
    headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
    headers.push((name.to_string(), value));
}

fn build_body(spec: &RequestSpec) -> Result<Option<String>, RequestBuildError> {
    if !spec.method.allows_body() || spec.body.is_empty() {
        return Ok(None);
    }

    match &spec.body {
        RequestBody::None => Ok(None),
        // Raw payloads are passed through verbatim
        RequestBody::Json { raw } | RequestBody::Raw { raw, .. } => Ok(Some(raw.clone())),
        RequestBody::Form { fields } => {
            let pairs: Vec<(&str, &str)> = fields
                .iter()
                .filter(|f| f.enabled && !f.key.is_empty())
                .map(|f| (f.key.as_str(), f.value.as_str()))
                .collect();
            Ok(Some(serde_urlencoded::to_string(&pairs)?))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use apiary_domain::request::{FormField, QueryParam};

    fn header_value<'a>(prepared: &'a PreparedRequest, name: &str) -> Option<&'a str> {
        prepared
            .headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_plain_url_passes_through() {
        let spec = RequestSpec::get("https://api.example.com/users");
        let prepared = prepare(&spec).unwrap();
        assert_eq!(prepared.url, "https://api.example.com/users");
        assert_eq!(prepared.body, None);
    }

    #[test]
    fn test_enabled_params_are_encoded_and_appended() {
        let mut spec = RequestSpec::get("https://api.example.com/search")
            .with_query("q", "hello world")
            .with_query("page", "2");
        spec.query_params.add(QueryParam::disabled("debug", "1"));

        let prepared = prepare(&spec).unwrap();
        assert_eq!(
            prepared.url,
            "https://api.example.com/search?q=hello+world&page=2"
        );
    }

    #[test]
    fn test_params_append_to_existing_query() {
        let spec = RequestSpec::get("https://api.example.com/search?lang=en")
            .with_query("page", "2");

        let prepared = prepare(&spec).unwrap();
        assert_eq!(
            prepared.url,
            "https://api.example.com/search?lang=en&page=2"
        );
    }

    #[test]
    fn test_disabled_headers_are_excluded() {
        let mut spec = RequestSpec::get("https://example.com")
            .with_header("Accept", "application/json");
        spec.headers
            .add(apiary_domain::request::Header::disabled("X-Debug", "1"));

        let prepared = prepare(&spec).unwrap();
        assert_eq!(header_value(&prepared, "Accept"), Some("application/json"));
        assert_eq!(header_value(&prepared, "X-Debug"), None);
    }

    #[test]
    fn test_content_type_defaults_for_json_post() {
        let mut spec = RequestSpec::post("https://example.com/api");
        spec.body = RequestBody::json(r#"{"a":1}"#);

        let prepared = prepare(&spec).unwrap();
        assert_eq!(
            header_value(&prepared, "Content-Type"),
            Some("application/json")
        );
        assert_eq!(prepared.body.as_deref(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_content_type_not_overridden_when_explicit() {
        let mut spec = RequestSpec::post("https://example.com/api")
            .with_header("Content-Type", "application/vnd.api+json");
        spec.body = RequestBody::json("{}");

        let prepared = prepare(&spec).unwrap();
        let content_types: Vec<_> = prepared
            .headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case("content-type"))
            .collect();
        assert_eq!(content_types.len(), 1);
        assert_eq!(content_types[0].1, "application/vnd.api+json");
    }

    #[test]
    fn test_get_requests_carry_no_body_or_content_type() {
        let mut spec = RequestSpec::get("https://example.com");
        spec.body = RequestBody::json(r#"{"ignored":true}"#);

        let prepared = prepare(&spec).unwrap();
        assert_eq!(prepared.body, None);
        assert_eq!(header_value(&prepared, "Content-Type"), None);
    }

    #[test]
    fn test_form_body_is_urlencoded() {
        let mut spec = RequestSpec::post("https://example.com/login");
        spec.body = RequestBody::form(vec![
            FormField::new("user", "alice smith"),
            FormField::new("pass", "p&w"),
            FormField::disabled("debug", "1"),
        ]);

        let prepared = prepare(&spec).unwrap();
        assert_eq!(
            header_value(&prepared, "Content-Type"),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(prepared.body.as_deref(), Some("user=alice+smith&pass=p%26w"));
    }

    #[test]
    fn test_bearer_auth_sets_authorization() {
        let mut spec = RequestSpec::get("https://example.com");
        spec.auth = AuthConfig::bearer("tok-123");

        let prepared = prepare(&spec).unwrap();
        assert_eq!(
            header_value(&prepared, "Authorization"),
            Some("Bearer tok-123")
        );
    }

    #[test]
    fn test_empty_bearer_token_adds_nothing() {
        let mut spec = RequestSpec::get("https://example.com");
        spec.auth = AuthConfig::bearer("");

        let prepared = prepare(&spec).unwrap();
        assert_eq!(header_value(&prepared, "Authorization"), None);
    }

    #[test]
    fn test_basic_auth_encodes_credentials() {
        let mut spec = RequestSpec::get("https://example.com");
        spec.auth = AuthConfig::basic("user", "pass");

        let prepared = prepare(&spec).unwrap();
        // base64("user:pass")
        assert_eq!(
            header_value(&prepared, "Authorization"),
            Some("Basic dXNlcjpwYXNz")
        );
    }

    #[test]
    fn test_basic_auth_requires_both_credentials() {
        let mut spec = RequestSpec::get("https://example.com");
        spec.auth = AuthConfig::basic("user", "");

        let prepared = prepare(&spec).unwrap();
        assert_eq!(header_value(&prepared, "Authorization"), None);
    }

    #[test]
    fn test_api_key_in_header() {
        let mut spec = RequestSpec::get("https://example.com");
        spec.auth = AuthConfig::api_key_header("X-Api-Key", "secret");

        let prepared = prepare(&spec).unwrap();
        assert_eq!(header_value(&prepared, "X-Api-Key"), Some("secret"));
    }

    #[test]
    fn test_api_key_in_query() {
        let mut spec = RequestSpec::get("https://example.com/data");
        spec.auth = AuthConfig::api_key_query("api_key", "se cret");

        let prepared = prepare(&spec).unwrap();
        assert_eq!(prepared.url, "https://example.com/data?api_key=se+cret");
        assert_eq!(header_value(&prepared, "api_key"), None);
    }

    #[test]
    fn test_auth_replaces_existing_authorization_header() {
        let mut spec = RequestSpec::get("https://example.com")
            .with_header("Authorization", "stale");
        spec.auth = AuthConfig::bearer("fresh");

        let prepared = prepare(&spec).unwrap();
        let auth_headers: Vec<_> = prepared
            .headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case("authorization"))
            .collect();
        assert_eq!(auth_headers.len(), 1);
        assert_eq!(auth_headers[0].1, "Bearer fresh");
    }

    #[test]
    fn test_timeout_is_carried_over() {
        let mut spec = RequestSpec::get("https://example.com");
        spec.timeout_ms = 5000;

        let prepared = prepare(&spec).unwrap();
        assert_eq!(prepared.timeout, Duration::from_millis(5000));
    }
}
