//! Send Request use case
//!
//! Turns one request template into exactly one normalized response
//! record: resolves variables, validates, dispatches through the HTTP
//! client port, recovers transport failures into a status-0 record, and
//! appends exactly one history entry per attempt.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use apiary_domain::request::RequestSpec;
use apiary_domain::response::ResponseSpec;
use apiary_domain::HistoryEntry;

use crate::environments::EnvironmentManager;
use crate::error::{ApplicationError, ApplicationResult};
use crate::history::HistoryLog;
use crate::ports::{HttpClient, KeyValueStore};
use crate::resolver::VariableResolver;

/// Use case for sending a single request.
pub struct SendRequest<C, S> {
    client: Arc<C>,
    environments: Arc<EnvironmentManager<S>>,
    history: Arc<HistoryLog<S>>,
}

impl<C: HttpClient, S: KeyValueStore> SendRequest<C, S> {
    /// Creates the use case from its collaborators.
    pub const fn new(
        client: Arc<C>,
        environments: Arc<EnvironmentManager<S>>,
        history: Arc<HistoryLog<S>>,
    ) -> Self {
        Self {
            client,
            environments,
            history,
        }
    }

    /// Sends a request template and returns the normalized response.
    ///
    /// The template is resolved against the current variable context
    /// first; the resolved copy is what gets sent and recorded. Transport
    /// failures come back as a `status = 0` response (never an error),
    /// and exactly one history entry is appended whether or not the
    /// attempt succeeded.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty URL or a non-http(s) scheme and
    /// `Http` for non-transport client failures; neither is recorded in
    /// history.
    pub async fn send(&self, template: &RequestSpec) -> ApplicationResult<ResponseSpec> {
        let resolver = VariableResolver::new(self.environments.resolution_context());
        let resolution = resolver.resolve_request(template);
        if !resolution.is_complete {
            debug!(unresolved = ?resolution.unresolved, "sending with unresolved placeholders");
        }
        let resolved = resolution.request;

        Self::validate(&resolved)?;

        debug!(method = %resolved.method, url = %resolved.url, "dispatching request");
        let start = Instant::now();

        let response = match self.client.execute(&resolved).await {
            Ok(response) => response,
            Err(error) if error.is_transport() => {
                warn!(%error, url = %resolved.url, "transport failure recovered as network error");
                ResponseSpec::network_error(error.to_string(), start.elapsed())
            }
            Err(error) => return Err(ApplicationError::Http(error)),
        };

        self.history
            .record(HistoryEntry::completed(resolved, response.clone()))
            .await;

        Ok(response)
    }

    /// Validates a resolved request before execution.
    fn validate(request: &RequestSpec) -> ApplicationResult<()> {
        if request.url.trim().is_empty() {
            return Err(ApplicationError::Validation("URL is required".to_string()));
        }

        if !request.url.starts_with("http://") && !request.url.starts_with("https://") {
            return Err(ApplicationError::Validation(
                "URL must start with http:// or https://".to_string(),
            ));
        }

        Ok(())
    }
}
