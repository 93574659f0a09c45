/// HTTP implementation of [`Backend`] on top of the synchronous `ureq` client.
///
/// Calls block the calling thread; the runtime gives every request its own
/// worker thread, so the dashboard itself never blocks. No timeout is applied
/// unless `backend.timeout_ms` is configured: the auto-tune call routinely
/// runs for several minutes.
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::types::{
    AnalysisResult, AnalyzeRequest, AutoTuneHistoryResponse, AutoTuneRequest, AutoTuneRun,
    EvalRun, EvalRunDetail, EvalRunRequest, QueryRequest, QueryResponse, RunListResponse,
    SubmittedEvalRun,
};
use super::{ApiError, Backend, require_id};
use crate::config::schema::BackendConfig;

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous backend client. Cheap to clone; clones share one agent.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    timeout: Option<Duration>,
    agent: ureq::Agent,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ApiClient {
    /// Build a client from the resolved config.
    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(&config.base_url, config.timeout_ms.map(Duration::from_millis))
    }

    /// Build a client for `base_url`. Trailing slashes are stripped.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            agent: builder.build(),
        }
    }

    /// The normalized base URL, for display.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let mut request = self.agent.get(&self.url(path));
        for (key, value) in query {
            request = request.query(key, value);
        }
        decode(request.call())
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        decode(self.agent.post(&self.url(path)).send_json(body))
    }
}

/// `/eval/runs/{id}/results` with the id escaped as a single path segment.
fn run_results_path(eval_run_id: &str) -> String {
    format!("/eval/runs/{}/results", urlencoding::encode(eval_run_id))
}

/// Classify a ureq outcome and decode the JSON body.
fn decode<T: DeserializeOwned>(result: Result<ureq::Response, ureq::Error>) -> Result<T, ApiError> {
    let response = match result {
        Ok(response) => response,
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().unwrap_or_default();
            return Err(ApiError::Http { status, body });
        }
        Err(ureq::Error::Transport(transport)) => {
            return Err(ApiError::Network(transport.to_string()));
        }
    };

    let text = response
        .into_string()
        .map_err(|e| ApiError::Network(format!("failed reading response body: {e}")))?;

    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
}

impl Backend for ApiClient {
    fn list_runs(&self, eval_set_id: &str) -> Result<Vec<EvalRun>, ApiError> {
        let eval_set_id = require_id("eval_set_id", eval_set_id)?;
        let resp: RunListResponse =
            self.get_json("/eval/runs/compare", &[("eval_set_id", eval_set_id)])?;
        Ok(resp.runs)
    }

    fn run_detail(&self, eval_run_id: &str) -> Result<EvalRunDetail, ApiError> {
        let eval_run_id = require_id("eval_run_id", eval_run_id)?;
        self.get_json(&run_results_path(eval_run_id), &[])
    }

    fn submit_eval_run(&self, request: &EvalRunRequest) -> Result<SubmittedEvalRun, ApiError> {
        require_id("eval_set_id", &request.eval_set_id)?;
        require_id("pipeline_config_id", &request.pipeline_config_id)?;
        self.post_json("/eval/run", request)
    }

    fn analyze(&self, eval_run_id: &str) -> Result<AnalysisResult, ApiError> {
        let eval_run_id = require_id("eval_run_id", eval_run_id)?;
        let body = AnalyzeRequest {
            eval_run_id: eval_run_id.to_string(),
        };
        self.post_json("/agent/analyze", &body)
    }

    fn query(&self, request: &QueryRequest) -> Result<QueryResponse, ApiError> {
        require_id("workspace_id", &request.workspace_id)?;
        if request.question.trim().is_empty() {
            return Err(ApiError::Validation("question must not be empty".to_string()));
        }
        self.post_json("/query", request)
    }

    fn auto_tune(&self, request: &AutoTuneRequest) -> Result<AutoTuneRun, ApiError> {
        require_id("workspace_id", &request.workspace_id)?;
        require_id("eval_set_id", &request.eval_set_id)?;
        self.post_json("/agent/auto-tune", request)
    }

    fn auto_tune_history(
        &self,
        workspace_id: &str,
        eval_set_id: &str,
    ) -> Result<Vec<AutoTuneRun>, ApiError> {
        let workspace_id = require_id("workspace_id", workspace_id)?;
        let eval_set_id = require_id("eval_set_id", eval_set_id)?;
        let resp: AutoTuneHistoryResponse = self.get_json(
            "/agent/auto-tune/history",
            &[("workspace_id", workspace_id), ("eval_set_id", eval_set_id)],
        )?;
        Ok(resp.runs)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
