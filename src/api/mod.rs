//! Gateway to the evaluation/optimization backend.
//!
//! One method per backend endpoint, each fire-once: no retries, no caching,
//! no request coalescing. Failures are classified into [`ApiError`] so the
//! dashboard stores can render them in their own scoped error slot.
//!
//! The [`Backend`] trait is the seam between the orchestration core and the
//! network. [`ApiClient`] is the real HTTP implementation; tests substitute
//! an in-process fake.

pub mod client;
pub mod types;

use thiserror::Error;

pub use client::ApiClient;
pub use types::{
    AnalysisResult, AutoTuneIteration, AutoTuneRequest, AutoTuneRun, ConfigOrigin, EvalResultRow,
    EvalRun, EvalRunDetail, EvalRunRequest, QueryRequest, QueryResponse, Score, SubmittedEvalRun,
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Classified failure of a gateway or orchestration operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request could not be sent or the response could not be received.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}{}", body_suffix(.body))]
    Http { status: u16, body: String },

    /// The response body was not the JSON shape we expected.
    #[error("invalid response: {0}")]
    Decode(String),

    /// Input rejected before any request was made.
    #[error("{0}")]
    Validation(String),

    /// The action needs at least one existing eval run.
    #[error("{0}")]
    EmptyPrerequisite(String),
}

fn body_suffix(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        String::new()
    } else {
        format!(": {body}")
    }
}

/// Reject empty or whitespace-only identifiers before they reach a URL.
pub fn require_id<'a>(name: &str, value: &'a str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ApiError::Validation(format!("{name} must not be empty")))
    } else {
        Ok(trimmed)
    }
}

// ---------------------------------------------------------------------------
// Backend seam
// ---------------------------------------------------------------------------

/// The backend contract consumed by the dashboard.
///
/// Implementations must be shareable across worker threads: every request
/// runs on its own thread and completes independently.
pub trait Backend: Send + Sync {
    /// `GET /eval/runs/compare?eval_set_id={id}`
    fn list_runs(&self, eval_set_id: &str) -> Result<Vec<EvalRun>, ApiError>;

    /// `GET /eval/runs/{eval_run_id}/results`
    fn run_detail(&self, eval_run_id: &str) -> Result<EvalRunDetail, ApiError>;

    /// `POST /eval/run`
    fn submit_eval_run(&self, request: &EvalRunRequest) -> Result<SubmittedEvalRun, ApiError>;

    /// `POST /agent/analyze`
    fn analyze(&self, eval_run_id: &str) -> Result<AnalysisResult, ApiError>;

    /// `POST /query`
    fn query(&self, request: &QueryRequest) -> Result<QueryResponse, ApiError>;

    /// `POST /agent/auto-tune` (blocks until the whole loop finishes)
    fn auto_tune(&self, request: &AutoTuneRequest) -> Result<AutoTuneRun, ApiError>;

    /// `GET /agent/auto-tune/history?workspace_id={id}&eval_set_id={id}`
    fn auto_tune_history(
        &self,
        workspace_id: &str,
        eval_set_id: &str,
    ) -> Result<Vec<AutoTuneRun>, ApiError>;
}
