/// Runtime tests against an in-process backend.
///
/// The fake backend counts calls and can delay individual answers, so the
/// tests exercise real worker threads and out-of-order completions.
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use ragboard::api::{
    AnalysisResult, ApiError, AutoTuneRequest, AutoTuneRun, Backend, EvalRun, EvalRunDetail,
    EvalRunRequest, QueryRequest, QueryResponse, SubmittedEvalRun,
};
use ragboard::dashboard::router::Tab;
use ragboard::dashboard::{Action, Dashboard};
use ragboard::runtime::Runtime;

// ---------------------------------------------------------------------------
// Fake backend
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeBackend {
    runs: Vec<EvalRun>,
    /// Detail requests for this id are answered only after a delay.
    slow_detail: Option<String>,
    list_calls: AtomicUsize,
    detail_calls: AtomicUsize,
    auto_tune_calls: AtomicUsize,
    history_calls: AtomicUsize,
    query_calls: AtomicUsize,
}

impl Backend for FakeBackend {
    fn list_runs(&self, _eval_set_id: &str) -> Result<Vec<EvalRun>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.runs.clone())
    }

    fn run_detail(&self, eval_run_id: &str) -> Result<EvalRunDetail, ApiError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if self.slow_detail.as_deref() == Some(eval_run_id) {
            thread::sleep(Duration::from_millis(200));
        }
        Ok(EvalRunDetail {
            pipeline_config_name: format!("config-{eval_run_id}"),
            ..EvalRunDetail::default()
        })
    }

    fn submit_eval_run(&self, request: &EvalRunRequest) -> Result<SubmittedEvalRun, ApiError> {
        Ok(SubmittedEvalRun {
            eval_run_id: format!("run-for-{}", request.pipeline_config_id),
        })
    }

    fn analyze(&self, _eval_run_id: &str) -> Result<AnalysisResult, ApiError> {
        Ok(AnalysisResult::default())
    }

    fn query(&self, request: &QueryRequest) -> Result<QueryResponse, ApiError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        Ok(QueryResponse {
            answer: format!("echo: {}", request.question),
            ..QueryResponse::default()
        })
    }

    fn auto_tune(&self, request: &AutoTuneRequest) -> Result<AutoTuneRun, ApiError> {
        self.auto_tune_calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        Ok(AutoTuneRun {
            starting_score: Some(0.70),
            final_score: Some(0.85),
            total_iterations: Some(request.max_iterations),
            ..AutoTuneRun::default()
        })
    }

    fn auto_tune_history(
        &self,
        _workspace_id: &str,
        _eval_set_id: &str,
    ) -> Result<Vec<AutoTuneRun>, ApiError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![AutoTuneRun {
            auto_tune_run_id: Some("t1".to_string()),
            final_score: Some(0.85),
            ..AutoTuneRun::default()
        }])
    }
}

fn runtime(backend: FakeBackend) -> (Arc<FakeBackend>, Runtime<FakeBackend>) {
    let backend = Arc::new(backend);
    let runtime = Runtime::new(Arc::clone(&backend), Dashboard::default());
    (backend, runtime)
}

fn eval_run(id: &str, created_at: &str) -> EvalRun {
    EvalRun {
        created_at: Some(created_at.to_string()),
        avg_overall: Some(0.5),
        ..EvalRun::placeholder(id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn double_start_sends_one_auto_tune_request() {
    let (backend, mut runtime) = runtime(FakeBackend::default());

    runtime.dispatch(Action::StartAutoTune {
        max_iterations: Some(3),
    });
    runtime.dispatch(Action::StartAutoTune {
        max_iterations: Some(3),
    });
    runtime.wait_idle();

    assert_eq!(backend.auto_tune_calls.load(Ordering::SeqCst), 1);
    let status = runtime.dashboard().autotune().status().unwrap();
    assert_eq!(
        status,
        "Auto tune complete. Final score 0.85 after 3 iterations."
    );
}

#[test]
fn auto_tune_success_reloads_history_and_configs() {
    let (backend, mut runtime) = runtime(FakeBackend {
        runs: vec![eval_run("r1", "2025-01-01T00:00:00Z")],
        ..FakeBackend::default()
    });

    runtime.dispatch(Action::StartAutoTune {
        max_iterations: None,
    });
    runtime.wait_idle();

    assert_eq!(backend.history_calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.list_calls.load(Ordering::SeqCst), 1);

    let view = runtime.dashboard().view();
    assert_eq!(view.auto_tune.history.len(), 1);
    assert_eq!(view.auto_tune.selected_index, Some(0));
    assert_eq!(view.leaderboard.rows.len(), 1);
}

#[test]
fn slow_detail_for_abandoned_selection_never_wins() {
    let (backend, mut runtime) = runtime(FakeBackend {
        slow_detail: Some("a".to_string()),
        ..FakeBackend::default()
    });

    runtime.dispatch(Action::SelectEvalRun {
        eval_run_id: "a".to_string(),
    });
    runtime.dispatch(Action::SelectEvalRun {
        eval_run_id: "b".to_string(),
    });
    runtime.wait_idle();

    assert_eq!(backend.detail_calls.load(Ordering::SeqCst), 2);
    let detail = runtime.dashboard().view().eval_viewer.detail;
    assert_eq!(detail.eval_run_id.as_deref(), Some("b"));
    assert_eq!(detail.config_name.as_deref(), Some("config-b"));
}

#[test]
fn opening_eval_viewer_loads_list_then_newest_detail() {
    let (backend, mut runtime) = runtime(FakeBackend {
        runs: vec![
            eval_run("old", "2025-01-01T00:00:00Z"),
            eval_run("new", "2025-01-02T00:00:00Z"),
        ],
        ..FakeBackend::default()
    });

    runtime.dispatch(Action::ActivateTab(Tab::EvalViewer));
    runtime.wait_idle();

    assert_eq!(backend.list_calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.detail_calls.load(Ordering::SeqCst), 1);
    let view = runtime.dashboard().view();
    assert_eq!(view.eval_viewer.selected_eval_run_id.as_deref(), Some("new"));
    assert_eq!(view.eval_viewer.detail.state, "loaded");
}

#[test]
fn submit_eval_run_reloads_the_browser() {
    let (backend, mut runtime) = runtime(FakeBackend::default());

    runtime.dispatch(Action::SubmitEvalRun {
        pipeline_config_id: "cfg-1".to_string(),
    });
    runtime.wait_idle();

    assert_eq!(backend.list_calls.load(Ordering::SeqCst), 1);
    let notice = runtime.dashboard().browser().notice().unwrap();
    assert!(notice.contains("run-for-cfg-1"), "{notice}");
}

#[test]
fn blank_query_never_reaches_backend() {
    let (backend, mut runtime) = runtime(FakeBackend::default());

    runtime.dispatch(Action::SubmitQuery {
        question: "  ".to_string(),
        top_k: None,
    });
    runtime.wait_idle();
    assert_eq!(backend.query_calls.load(Ordering::SeqCst), 0);

    runtime.dispatch(Action::SubmitQuery {
        question: "what is RAG?".to_string(),
        top_k: Some(3),
    });
    runtime.wait_idle();
    assert_eq!(backend.query_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        runtime.dashboard().view().live_query.answer.as_deref(),
        Some("echo: what is RAG?")
    );
}
