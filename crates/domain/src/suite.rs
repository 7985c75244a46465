//! Batch suite domain types
//!
//! A suite is a named, ordered collection of request templates that is
//! executed as one logical run with bounded concurrency.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::id::generate_id;
use crate::request::{RequestSpec, DEFAULT_TIMEOUT_MS};

/// Execution settings for a suite run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteSettings {
    /// How many templates run concurrently within a chunk.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Delay between chunks in milliseconds (not applied after the last).
    #[serde(default)]
    pub delay_ms: u64,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

const fn default_concurrency() -> usize {
    1
}

const fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl SuiteSettings {
    /// Returns the effective chunk size (at least 1).
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        if self.concurrency == 0 {
            1
        } else {
            self.concurrency
        }
    }
}

impl Default for SuiteSettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            delay_ms: 0,
            timeout_ms: default_timeout(),
        }
    }
}

/// Lifecycle state of a suite.
///
/// `Running` is entered when a run starts; `Cancelled` is reachable only
/// from `Running` via an explicit stop. A run with any failed template
/// terminates as `Failed` even though individual failures are tolerated
/// mid-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SuiteStatus {
    /// No run in progress.
    #[default]
    Idle,
    /// A run is in flight.
    Running,
    /// The last run finished with every template passing.
    Completed,
    /// The last run finished with at least one failed template.
    Failed,
    /// The last run was stopped before completing.
    Cancelled,
}

impl SuiteStatus {
    /// Returns true for terminal run states.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// A named, ordered collection of request templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suite {
    /// Unique identifier.
    pub id: String,
    /// Suite name.
    pub name: String,
    /// Ordered templates executed by a run.
    #[serde(default)]
    pub requests: Vec<RequestSpec>,
    /// Execution settings.
    #[serde(default)]
    pub settings: SuiteSettings,
    /// Current lifecycle state.
    #[serde(default)]
    pub status: SuiteStatus,
    /// When the suite was created.
    pub created_at: DateTime<Utc>,
    /// When the suite was last modified.
    pub updated_at: DateTime<Utc>,
    /// When the suite last finished a run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,
    /// Success rate of the last run (percentage).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_rate: Option<f64>,
}

impl Suite {
    /// Creates a new idle suite.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(),
            name: name.into(),
            requests: Vec::new(),
            settings: SuiteSettings::default(),
            status: SuiteStatus::Idle,
            created_at: now,
            updated_at: now,
            last_run_at: None,
            success_rate: None,
        }
    }

    /// Adds a template to the end of the suite (builder style).
    #[must_use]
    pub fn with_request(mut self, request: RequestSpec) -> Self {
        self.requests.push(request);
        self
    }

    /// Sets the execution settings (builder style).
    #[must_use]
    pub const fn with_settings(mut self, settings: SuiteSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Returns the number of templates in the suite.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Returns true if the suite has no templates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Outcome of a single template within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateOutcome {
    /// The request completed with a 2xx status.
    Passed,
    /// The request completed with a non-2xx status or failed at the
    /// transport level.
    Failed,
    /// The template was never dispatched because the run was cancelled.
    Skipped,
}

/// Per-template result within a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateResult {
    /// Identifier of the executed template.
    pub request_id: Uuid,
    /// Name of the executed template.
    pub request_name: String,
    /// Pass/fail/skip outcome.
    pub outcome: TemplateOutcome,
    /// Measured response time in milliseconds (0 for skipped).
    pub response_time_ms: u64,
    /// HTTP status code, when a response was received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Failure description, when the template did not pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TemplateResult {
    /// Creates a skipped result for a template that never ran.
    #[must_use]
    pub fn skipped(request: &RequestSpec) -> Self {
        Self {
            request_id: request.id,
            request_name: request.name.clone(),
            outcome: TemplateOutcome::Skipped,
            response_time_ms: 0,
            status_code: None,
            error: None,
        }
    }
}

/// Aggregate statistics of a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RunSummary {
    /// Number of templates in the suite.
    pub total_requests: usize,
    /// Templates that passed.
    pub passed_requests: usize,
    /// Templates that failed.
    pub failed_requests: usize,
    /// Templates skipped due to cancellation.
    pub skipped_requests: usize,
    /// Sum of all measured response times in milliseconds.
    pub total_time_ms: u64,
    /// Mean response time across completed templates in milliseconds.
    pub average_response_time_ms: f64,
    /// `passed / completed * 100`.
    pub success_rate: f64,
}

impl RunSummary {
    /// Computes a summary from per-template results.
    ///
    /// Completed means passed or failed; skipped templates do not count
    /// toward response-time or success-rate math.
    #[must_use]
    pub fn from_results(results: &[TemplateResult]) -> Self {
        let passed = results
            .iter()
            .filter(|r| r.outcome == TemplateOutcome::Passed)
            .count();
        let failed = results
            .iter()
            .filter(|r| r.outcome == TemplateOutcome::Failed)
            .count();
        let skipped = results
            .iter()
            .filter(|r| r.outcome == TemplateOutcome::Skipped)
            .count();

        let completed = passed + failed;
        let total_time_ms: u64 = results.iter().map(|r| r.response_time_ms).sum();

        #[allow(clippy::cast_precision_loss)]
        let (average_response_time_ms, success_rate) = if completed == 0 {
            (0.0, 0.0)
        } else {
            (
                total_time_ms as f64 / completed as f64,
                passed as f64 / completed as f64 * 100.0,
            )
        };

        Self {
            total_requests: results.len(),
            passed_requests: passed,
            failed_requests: failed,
            skipped_requests: skipped,
            total_time_ms,
            average_response_time_ms,
            success_rate,
        }
    }
}

/// Final record of one batch run, computed once the run reaches a
/// terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Unique identifier of this run.
    pub id: String,
    /// The suite that was executed.
    pub suite_id: String,
    /// Suite name at run time.
    pub suite_name: String,
    /// Terminal status of the run.
    pub status: SuiteStatus,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run reached its terminal state.
    pub finished_at: DateTime<Utc>,
    /// Wall-clock duration of the run in milliseconds.
    pub duration_ms: u64,
    /// Per-template results in chunk order.
    pub results: Vec<TemplateResult>,
    /// Aggregate statistics.
    pub summary: RunSummary,
}
