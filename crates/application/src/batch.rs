//! Batch runner
//!
//! Executes a suite's templates as one logical run: consecutive chunks
//! of `concurrency` templates, each chunk dispatched concurrently and
//! fully settled before the next starts, with an optional delay between
//! chunks and cooperative cancellation checked only at chunk boundaries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, warn};

use apiary_domain::generate_id;
use apiary_domain::request::RequestSpec;
use apiary_domain::suite::{
    BatchResult, RunSummary, Suite, SuiteStatus, TemplateOutcome, TemplateResult,
};

use crate::environments::EnvironmentManager;
use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::{CancellationToken, HttpClient, KeyValueStore};
use crate::resolver::{ResolutionContext, VariableResolver};
use crate::suites::SuiteStore;

/// Executes suites with bounded concurrency and aggregates results.
///
/// One run per suite id may be in flight at a time; a second `run_suite`
/// call for the same id is rejected while the first is running.
pub struct BatchRunner<C, S> {
    client: Arc<C>,
    environments: Arc<EnvironmentManager<S>>,
    suites: Arc<SuiteStore<S>>,
    running: Mutex<HashMap<String, CancellationToken>>,
}

impl<C, S> BatchRunner<C, S>
where
    C: HttpClient + 'static,
    S: KeyValueStore,
{
    /// Creates a runner from its collaborators.
    pub fn new(
        client: Arc<C>,
        environments: Arc<EnvironmentManager<S>>,
        suites: Arc<SuiteStore<S>>,
    ) -> Self {
        Self {
            client,
            environments,
            suites,
            running: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true if a run for the suite is currently in flight.
    pub fn is_running(&self, suite_id: &str) -> bool {
        #[allow(clippy::unwrap_used)] // poisoned only if a holder panicked
        self.running.lock().unwrap().contains_key(suite_id)
    }

    /// Signals a running suite to stop at the next chunk boundary.
    ///
    /// Requests already dispatched run to their own timeout; templates
    /// never reached are recorded as skipped. Returns true iff a running
    /// run was signalled.
    pub fn stop_suite(&self, suite_id: &str) -> bool {
        #[allow(clippy::unwrap_used)] // poisoned only if a holder panicked
        let running = self.running.lock().unwrap();
        running.get(suite_id).is_some_and(|token| {
            token.cancel();
            true
        })
    }

    /// Executes all templates of a suite and returns the aggregate result.
    ///
    /// Individual template failures (transport errors or non-2xx
    /// statuses) never abort the run; they surface as failed per-template
    /// results and make the terminal status `Failed`. Only an explicit
    /// `stop_suite` ends the run early.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown suite ids, `SuiteAlreadyRunning`
    /// when a run for this id is in flight, and `Storage` when run state
    /// cannot be persisted.
    pub async fn run_suite(&self, suite_id: &str) -> ApplicationResult<BatchResult> {
        let suite = self
            .suites
            .get(suite_id)
            .ok_or_else(|| ApplicationError::NotFound(format!("suite {suite_id}")))?;

        let token = {
            #[allow(clippy::unwrap_used)] // poisoned only if a holder panicked
            let mut running = self.running.lock().unwrap();
            if running.contains_key(suite_id) {
                return Err(ApplicationError::SuiteAlreadyRunning(suite_id.to_string()));
            }
            let token = CancellationToken::new();
            running.insert(suite_id.to_string(), token.clone());
            token
        };

        let outcome = self.execute_run(&suite, &token).await;

        {
            #[allow(clippy::unwrap_used)] // poisoned only if a holder panicked
            let mut running = self.running.lock().unwrap();
            running.remove(suite_id);
        }

        outcome
    }

    async fn execute_run(
        &self,
        suite: &Suite,
        token: &CancellationToken,
    ) -> ApplicationResult<BatchResult> {
        self.suites.set_status(&suite.id, SuiteStatus::Running).await?;

        let started_at = Utc::now();
        let start = Instant::now();
        let chunk_size = suite.settings.chunk_size();
        let delay = Duration::from_millis(suite.settings.delay_ms);

        let mut results: Vec<TemplateResult> = Vec::with_capacity(suite.requests.len());
        let mut cancelled = false;

        for (index, chunk) in suite.requests.chunks(chunk_size).enumerate() {
            // Cancellation is observed only between chunks
            if token.is_cancelled() {
                cancelled = true;
                break;
            }

            if index > 0 && !delay.is_zero() {
                sleep(delay).await;
                if token.is_cancelled() {
                    cancelled = true;
                    break;
                }
            }

            debug!(suite = %suite.id, chunk = index, size = chunk.len(), "executing chunk");

            // Fire the whole chunk, then wait for every member to settle.
            // A member's failure never aborts its siblings.
            let mut join_set = JoinSet::new();
            for request in chunk {
                let client = Arc::clone(&self.client);
                // Last-write-wins read of the live context at dispatch time
                let context = self.environments.resolution_context();
                let mut request = request.clone();
                request.timeout_ms = suite.settings.timeout_ms;
                join_set.spawn(execute_template(client, context, request));
            }

            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok(result) => results.push(result),
                    Err(join_error) => {
                        warn!(%join_error, "batch template task did not settle");
                    }
                }
            }
        }

        // Templates in chunks never reached count as skipped
        for request in &suite.requests[results.len()..] {
            results.push(TemplateResult::skipped(request));
        }

        let summary = RunSummary::from_results(&results);
        let status = if cancelled {
            SuiteStatus::Cancelled
        } else if summary.failed_requests > 0 {
            SuiteStatus::Failed
        } else {
            SuiteStatus::Completed
        };

        let finished_at = Utc::now();
        #[allow(clippy::cast_possible_truncation)]
        let batch = BatchResult {
            id: generate_id(),
            suite_id: suite.id.clone(),
            suite_name: suite.name.clone(),
            status,
            started_at,
            finished_at,
            duration_ms: start.elapsed().as_millis() as u64,
            results,
            summary,
        };

        self.suites.record_result(batch.clone()).await?;
        self.suites
            .finish_run(&suite.id, status, finished_at, batch.summary.success_rate)
            .await?;

        debug!(
            suite = %suite.id,
            status = ?status,
            passed = batch.summary.passed_requests,
            failed = batch.summary.failed_requests,
            skipped = batch.summary.skipped_requests,
            "run finished"
        );

        Ok(batch)
    }
}

/// Resolves and executes one template, converting every failure mode
/// into a per-template result.
async fn execute_template<C: HttpClient>(
    client: Arc<C>,
    context: ResolutionContext,
    template: RequestSpec,
) -> TemplateResult {
    let resolver = VariableResolver::new(context);
    let resolved = resolver.resolve_request(&template).request;

    let start = Instant::now();
    match client.execute(&resolved).await {
        Ok(response) => {
            #[allow(clippy::cast_possible_truncation)]
            let response_time_ms = response.duration.as_millis() as u64;
            if response.is_success() {
                TemplateResult {
                    request_id: resolved.id,
                    request_name: resolved.name,
                    outcome: TemplateOutcome::Passed,
                    response_time_ms,
                    status_code: Some(response.status),
                    error: None,
                }
            } else {
                TemplateResult {
                    request_id: resolved.id,
                    request_name: resolved.name,
                    outcome: TemplateOutcome::Failed,
                    response_time_ms,
                    status_code: Some(response.status),
                    error: Some(format!(
                        "unexpected status {} {}",
                        response.status, response.status_text
                    )),
                }
            }
        }
        Err(error) => {
            #[allow(clippy::cast_possible_truncation)]
            let response_time_ms = start.elapsed().as_millis() as u64;
            TemplateResult {
                request_id: resolved.id,
                request_name: resolved.name,
                outcome: TemplateOutcome::Failed,
                response_time_ms,
                status_code: None,
                error: Some(error.to_string()),
            }
        }
    }
}
