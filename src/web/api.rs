//! JSON API handlers for the web dashboard.
//!
//! State-changing handlers turn the request body into an [`Action`],
//! dispatch it through the runtime and answer with the fresh view, so the
//! page never has to guess what changed.

use std::io::Cursor;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tiny_http::{Response, StatusCode};

use crate::activity::reporter;
use crate::api::Backend;
use crate::config;
use crate::dashboard::Action;
use crate::dashboard::router::Tab;
use crate::runtime::Runtime;

use super::with_content_type;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize)]
struct TabRequest {
    tab: Tab,
}

#[derive(serde::Deserialize)]
struct EvalRunTarget {
    eval_run_id: String,
}

#[derive(serde::Deserialize)]
struct SubmitRequest {
    pipeline_config_id: String,
}

#[derive(serde::Deserialize, Default)]
#[serde(default)]
struct AutoTuneStart {
    max_iterations: Option<u32>,
}

#[derive(serde::Deserialize)]
struct HistorySelect {
    index: usize,
}

#[derive(serde::Deserialize)]
struct QueryBody {
    question: String,
    #[serde(default)]
    top_k: Option<u32>,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct OperationStatResponse {
    operation: String,
    count: usize,
    failures: usize,
    failure_pct: f64,
    avg_latency_ms: f64,
    max_latency_ms: u64,
    last_error: Option<String>,
}

#[derive(Serialize)]
struct ActivityResponse {
    days: Option<u32>,
    operations: Vec<OperationStatResponse>,
}

#[derive(Serialize)]
struct ConfigResponse {
    config: config::schema::RagboardConfig,
    toml_text: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON success response.
pub(crate) fn json_response<T: Serialize>(data: &T) -> Result<Response<Cursor<Vec<u8>>>> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(with_content_type(
        Response::from_data(body.into_bytes()),
        "application/json; charset=utf-8",
    )
    .with_status_code(StatusCode(200)))
}

/// Decode a request body; a missing or blank body reads as `{}`.
fn parse_body<T: DeserializeOwned>(body: Option<&str>) -> Result<T> {
    let body = body.filter(|b| !b.trim().is_empty()).unwrap_or("{}");
    serde_json::from_str(body).context("invalid JSON request body")
}

/// Parse the `?days=N` query parameter from a URL.
fn parse_days_param(url: &str) -> Option<u32> {
    url.split('?').nth(1)?.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        if k == "days" { v.parse().ok() } else { None }
    })
}

fn act<B: Backend + 'static>(
    runtime: &mut Runtime<B>,
    action: Action,
) -> Result<Response<Cursor<Vec<u8>>>> {
    runtime.dispatch(action);
    runtime.poll();
    json_response(&runtime.dashboard().view())
}

// ---------------------------------------------------------------------------
// Dashboard handlers
// ---------------------------------------------------------------------------

/// `GET /api/state`: the full view model.
pub fn get_state<B: Backend + 'static>(runtime: &mut Runtime<B>) -> Result<Response<Cursor<Vec<u8>>>> {
    runtime.poll();
    json_response(&runtime.dashboard().view())
}

/// `POST /api/tab`: `{ "tab": "eval-viewer" }`
pub fn post_tab<B: Backend + 'static>(
    runtime: &mut Runtime<B>,
    body: Option<&str>,
) -> Result<Response<Cursor<Vec<u8>>>> {
    let req: TabRequest = parse_body(body)?;
    act(runtime, Action::ActivateTab(req.tab))
}

/// `POST /api/eval/select`: `{ "eval_run_id": "..." }`
pub fn post_eval_select<B: Backend + 'static>(
    runtime: &mut Runtime<B>,
    body: Option<&str>,
) -> Result<Response<Cursor<Vec<u8>>>> {
    let req: EvalRunTarget = parse_body(body)?;
    act(
        runtime,
        Action::SelectEvalRun {
            eval_run_id: req.eval_run_id,
        },
    )
}

/// `POST /api/eval/submit`: `{ "pipeline_config_id": "..." }`
pub fn post_eval_submit<B: Backend + 'static>(
    runtime: &mut Runtime<B>,
    body: Option<&str>,
) -> Result<Response<Cursor<Vec<u8>>>> {
    let req: SubmitRequest = parse_body(body)?;
    act(
        runtime,
        Action::SubmitEvalRun {
            pipeline_config_id: req.pipeline_config_id,
        },
    )
}

/// `POST /api/analysis/target`: `{ "eval_run_id": "..." }`
pub fn post_analysis_target<B: Backend + 'static>(
    runtime: &mut Runtime<B>,
    body: Option<&str>,
) -> Result<Response<Cursor<Vec<u8>>>> {
    let req: EvalRunTarget = parse_body(body)?;
    act(
        runtime,
        Action::ChooseAnalysisTarget {
            eval_run_id: req.eval_run_id,
        },
    )
}

/// `POST /api/analysis/run`
pub fn post_analysis_run<B: Backend + 'static>(
    runtime: &mut Runtime<B>,
) -> Result<Response<Cursor<Vec<u8>>>> {
    act(runtime, Action::RunAnalysis)
}

/// `POST /api/autotune/start`: `{ "max_iterations": 3 }` (optional)
pub fn post_autotune_start<B: Backend + 'static>(
    runtime: &mut Runtime<B>,
    body: Option<&str>,
) -> Result<Response<Cursor<Vec<u8>>>> {
    let req: AutoTuneStart = parse_body(body)?;
    act(
        runtime,
        Action::StartAutoTune {
            max_iterations: req.max_iterations,
        },
    )
}

/// `POST /api/autotune/select`: `{ "index": 0 }`
pub fn post_autotune_select<B: Backend + 'static>(
    runtime: &mut Runtime<B>,
    body: Option<&str>,
) -> Result<Response<Cursor<Vec<u8>>>> {
    let req: HistorySelect = parse_body(body)?;
    act(runtime, Action::SelectAutoTuneRun { index: req.index })
}

/// `POST /api/query`: `{ "question": "...", "top_k": 5 }`
pub fn post_query<B: Backend + 'static>(
    runtime: &mut Runtime<B>,
    body: Option<&str>,
) -> Result<Response<Cursor<Vec<u8>>>> {
    let req: QueryBody = parse_body(body)?;
    act(
        runtime,
        Action::SubmitQuery {
            question: req.question,
            top_k: req.top_k,
        },
    )
}

/// `POST /api/errors/clear`
pub fn post_errors_clear<B: Backend + 'static>(
    runtime: &mut Runtime<B>,
) -> Result<Response<Cursor<Vec<u8>>>> {
    act(runtime, Action::ClearErrors)
}

// ---------------------------------------------------------------------------
// Ambient handlers
// ---------------------------------------------------------------------------

/// `GET /api/activity?days=N`: per-operation request statistics.
pub fn get_activity(url: &str) -> Result<Response<Cursor<Vec<u8>>>> {
    let days = parse_days_param(url);
    let operations = reporter::compute_operation_stats(days)
        .into_iter()
        .map(|stat| OperationStatResponse {
            failure_pct: stat.failure_pct(),
            operation: stat.operation,
            count: stat.count,
            failures: stat.failures,
            avg_latency_ms: stat.avg_latency_ms,
            max_latency_ms: stat.max_latency_ms,
            last_error: stat.last_error,
        })
        .collect();

    json_response(&ActivityResponse { days, operations })
}

/// `GET /api/config`: current effective configuration.
pub fn get_config() -> Result<Response<Cursor<Vec<u8>>>> {
    let cfg = config::load();
    let toml_text = toml::to_string_pretty(&cfg).unwrap_or_default();

    json_response(&ConfigResponse {
        config: cfg,
        toml_text,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_days_param_extracts_value() {
        assert_eq!(parse_days_param("/api/activity?days=7"), Some(7));
        assert_eq!(parse_days_param("/api/activity?foo=bar&days=14"), Some(14));
    }

    #[test]
    fn parse_days_param_returns_none_for_missing_or_invalid() {
        assert_eq!(parse_days_param("/api/activity"), None);
        assert_eq!(parse_days_param("/api/activity?days=abc"), None);
    }

    #[test]
    fn tab_request_uses_kebab_case_slugs() {
        let req: TabRequest = parse_body(Some(r#"{"tab": "auto-tune-explorer"}"#)).unwrap();
        assert_eq!(req.tab, Tab::AutoTuneExplorer);
        assert!(parse_body::<TabRequest>(Some(r#"{"tab": "settings"}"#)).is_err());
    }

    #[test]
    fn blank_body_reads_as_empty_object() {
        let req: AutoTuneStart = parse_body(None).unwrap();
        assert_eq!(req.max_iterations, None);
        let req: AutoTuneStart = parse_body(Some("  ")).unwrap();
        assert_eq!(req.max_iterations, None);
    }

    #[test]
    fn query_body_top_k_is_optional() {
        let req: QueryBody = parse_body(Some(r#"{"question": "why?"}"#)).unwrap();
        assert_eq!(req.question, "why?");
        assert_eq!(req.top_k, None);
    }
}
