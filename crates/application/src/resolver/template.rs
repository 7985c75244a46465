//! Whole-request resolution
//!
//! Applies the resolution engine to every placeholder-bearing field of a
//! request template: URL, headers, query parameters, body, and auth.

use apiary_domain::auth::AuthConfig;
use apiary_domain::request::{
    FormField, Header, Headers, QueryParam, QueryParams, RequestBody, RequestSpec,
};

use super::engine::VariableResolver;

/// Output of resolving a request template.
#[derive(Debug, Clone)]
pub struct RequestResolution {
    /// The request with all known placeholders substituted.
    pub request: RequestSpec,
    /// Distinct unresolved names across every field, sorted.
    pub unresolved: Vec<String>,
    /// Whether every placeholder was substituted.
    pub is_complete: bool,
}

impl VariableResolver {
    /// Resolves all placeholders in a request template.
    ///
    /// The template itself is never mutated; an immutable resolved copy
    /// is produced for sending.
    #[must_use]
    pub fn resolve_request(&self, request: &RequestSpec) -> RequestResolution {
        let mut resolved_request = request.clone();
        let mut all_unresolved = Vec::new();

        // URL
        let url_result = self.resolve(&request.url);
        resolved_request.url = url_result.resolved;
        all_unresolved.extend(url_result.unresolved);

        // Headers
        let mut resolved_headers = Headers::new();
        for header in request.headers.all() {
            let name_result = self.resolve(&header.name);
            let value_result = self.resolve(&header.value);

            all_unresolved.extend(name_result.unresolved);
            all_unresolved.extend(value_result.unresolved);

            let mut resolved_header = Header::new(name_result.resolved, value_result.resolved);
            resolved_header.enabled = header.enabled;
            resolved_headers.add(resolved_header);
        }
        resolved_request.headers = resolved_headers;

        // Query params
        let mut resolved_params = QueryParams::new();
        for param in request.query_params.all() {
            let key_result = self.resolve(&param.key);
            let value_result = self.resolve(&param.value);

            all_unresolved.extend(key_result.unresolved);
            all_unresolved.extend(value_result.unresolved);

            let mut resolved_param = QueryParam::new(key_result.resolved, value_result.resolved);
            resolved_param.enabled = param.enabled;
            resolved_params.add(resolved_param);
        }
        resolved_request.query_params = resolved_params;

        // Body
        resolved_request.body = self.resolve_body(&request.body, &mut all_unresolved);

        // Auth
        resolved_request.auth = self.resolve_auth(&request.auth, &mut all_unresolved);

        all_unresolved.sort();
        all_unresolved.dedup();

        let is_complete = all_unresolved.is_empty();
        RequestResolution {
            request: resolved_request,
            unresolved: all_unresolved,
            is_complete,
        }
    }

    fn resolve_body(&self, body: &RequestBody, unresolved: &mut Vec<String>) -> RequestBody {
        match body {
            RequestBody::None => RequestBody::None,
            RequestBody::Json { raw } => {
                let result = self.resolve(raw);
                unresolved.extend(result.unresolved);
                RequestBody::Json {
                    raw: result.resolved,
                }
            }
            RequestBody::Raw { raw, content_type } => {
                let result = self.resolve(raw);
                unresolved.extend(result.unresolved);
                RequestBody::Raw {
                    raw: result.resolved,
                    content_type: content_type.clone(),
                }
            }
            RequestBody::Form { fields } => {
                let resolved_fields = fields
                    .iter()
                    .map(|field| {
                        let key_result = self.resolve(&field.key);
                        let value_result = self.resolve(&field.value);
                        unresolved.extend(key_result.unresolved);
                        unresolved.extend(value_result.unresolved);

                        FormField {
                            key: key_result.resolved,
                            value: value_result.resolved,
                            enabled: field.enabled,
                        }
                    })
                    .collect();
                RequestBody::Form {
                    fields: resolved_fields,
                }
            }
        }
    }

    fn resolve_auth(&self, auth: &AuthConfig, unresolved: &mut Vec<String>) -> AuthConfig {
        match auth {
            AuthConfig::None => AuthConfig::None,
            AuthConfig::Bearer { token } => {
                let token_result = self.resolve(token);
                unresolved.extend(token_result.unresolved);

                AuthConfig::Bearer {
                    token: token_result.resolved,
                }
            }
            AuthConfig::Basic { username, password } => {
                let user_result = self.resolve(username);
                let pass_result = self.resolve(password);
                unresolved.extend(user_result.unresolved);
                unresolved.extend(pass_result.unresolved);

                AuthConfig::Basic {
                    username: user_result.resolved,
                    password: pass_result.resolved,
                }
            }
            AuthConfig::ApiKey {
                name,
                value,
                location,
            } => {
                let name_result = self.resolve(name);
                let value_result = self.resolve(value);
                unresolved.extend(name_result.unresolved);
                unresolved.extend(value_result.unresolved);

                AuthConfig::ApiKey {
                    name: name_result.resolved,
                    value: value_result.resolved,
                    location: *location,
                }
            }
        }
    }
}
