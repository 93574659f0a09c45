//! Serializable snapshot of the dashboard, rendered by the web page and the
//! CLI. All score formatting and placeholder text is decided here so every
//! surface shows the same strings.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::api::{AnalysisResult, AutoTuneRun, EvalResultRow, EvalRun, EvalRunDetail};

use super::Dashboard;
use super::analysis::AnalysisState;
use super::browser::assign_serials;
use super::format::{count_noun, format_delta, format_score, progress_label, serial_label};
use super::router::Tab;
use super::selection::DetailState;

pub const EMPTY_RUNS_MESSAGE: &str = "No evaluation runs yet. Run an evaluation first.";
pub const DETAIL_PROMPT: &str = "Select an evaluation run to view its results.";
pub const DETAIL_LOADING: &str = "Loading results...";
pub const DETAIL_UNAVAILABLE: &str = "Results could not be loaded for this run.";
pub const EMPTY_SECTION: &str = "None found.";
pub const EMPTY_HISTORY_MESSAGE: &str = "No auto tune runs yet.";

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub active_tab: Tab,
    pub tabs: Vec<TabView>,
    pub eval_viewer: EvalViewerView,
    pub leaderboard: LeaderboardView,
    pub analysis: AnalysisView,
    pub auto_tune: AutoTuneView,
    pub live_query: LiveQueryView,
    pub global_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TabView {
    pub slug: &'static str,
    pub title: &'static str,
    pub active: bool,
}

/// One eval run as a table row. Scores are preformatted.
#[derive(Debug, Clone, Serialize)]
pub struct RunRow {
    pub serial: Option<String>,
    pub eval_run_id: String,
    pub config_name: String,
    pub origin: String,
    pub created_at: Option<String>,
    pub status: Option<String>,
    pub progress: String,
    pub overall: String,
    pub relevance: String,
    pub faithfulness: String,
    pub completeness: String,
    pub selected: bool,
}

impl RunRow {
    fn new(run: &EvalRun, serial: Option<u32>, selected: Option<&str>) -> Self {
        Self {
            serial: serial.map(serial_label),
            eval_run_id: run.eval_run_id.clone(),
            config_name: run.resolved_config_name().to_string(),
            origin: run.origin.to_string(),
            created_at: run.created_at.clone(),
            status: run.status.clone(),
            progress: progress_label(run.completed, run.total),
            overall: format_score(run.avg_overall),
            relevance: format_score(run.avg_relevance),
            faithfulness: format_score(run.avg_faithfulness),
            completeness: format_score(run.avg_completeness),
            selected: selected == Some(run.eval_run_id.as_str()),
        }
    }
}

// ---------------------------------------------------------------------------
// Eval viewer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct EvalViewerView {
    pub loading: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
    /// Set when a list loaded and was empty.
    pub empty_message: Option<String>,
    pub runs: Vec<RunRow>,
    pub selected_eval_run_id: Option<String>,
    pub detail: DetailView,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailView {
    /// `empty`, `loading`, `loaded` or `unavailable`.
    pub state: &'static str,
    pub message: Option<String>,
    pub eval_run_id: Option<String>,
    pub config_name: Option<String>,
    pub eval_set_name: Option<String>,
    pub status: Option<String>,
    pub summary_metrics: Vec<MetricView>,
    pub results: Vec<ResultRowView>,
}

impl DetailView {
    fn placeholder(state: &'static str, message: &str, eval_run_id: Option<&str>) -> Self {
        Self {
            state,
            message: Some(message.to_string()),
            eval_run_id: eval_run_id.map(str::to_string),
            config_name: None,
            eval_set_name: None,
            status: None,
            summary_metrics: Vec::new(),
            results: Vec::new(),
        }
    }

    fn from_state(state: &DetailState) -> Self {
        match state {
            DetailState::Empty => Self::placeholder("empty", DETAIL_PROMPT, None),
            DetailState::Loading { eval_run_id } => {
                Self::placeholder("loading", DETAIL_LOADING, Some(eval_run_id))
            }
            DetailState::Unavailable { eval_run_id } => {
                Self::placeholder("unavailable", DETAIL_UNAVAILABLE, Some(eval_run_id))
            }
            DetailState::Loaded {
                eval_run_id,
                detail,
            } => Self::loaded(eval_run_id, detail),
        }
    }

    fn loaded(eval_run_id: &str, detail: &EvalRunDetail) -> Self {
        Self {
            state: "loaded",
            message: None,
            eval_run_id: Some(eval_run_id.to_string()),
            config_name: Some(detail.pipeline_config_name.clone()),
            eval_set_name: Some(detail.eval_set_name.clone()),
            status: detail.status.clone(),
            summary_metrics: detail
                .summary_metrics
                .iter()
                .map(|(name, value)| MetricView {
                    name: name.clone(),
                    value: metric_value(value),
                })
                .collect(),
            results: detail.results.iter().map(ResultRowView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricView {
    pub name: String,
    pub value: String,
}

fn metric_value(value: &Value) -> String {
    match value {
        Value::Number(n) => format_score(n.as_f64()),
        Value::String(s) => s.clone(),
        Value::Null => format_score(None),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultRowView {
    pub question: String,
    pub answer: String,
    pub judge_explanation: String,
    pub overall: String,
    pub relevance: String,
    pub faithfulness: String,
    pub completeness: String,
}

impl From<&EvalResultRow> for ResultRowView {
    fn from(row: &EvalResultRow) -> Self {
        Self {
            question: row.question.clone(),
            answer: row.answer.clone(),
            judge_explanation: row.judge_explanation.clone(),
            overall: format_score(row.resolved_overall()),
            relevance: format_score(row.resolved_relevance()),
            faithfulness: format_score(row.resolved_faithfulness()),
            completeness: format_score(row.resolved_completeness()),
        }
    }
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardView {
    pub loading: bool,
    pub error: Option<String>,
    pub empty_message: Option<String>,
    pub rows: Vec<RunRow>,
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisView {
    /// `idle`, `analyzing`, `succeeded` or `failed`.
    pub state: &'static str,
    pub target: Option<String>,
    pub enabled: bool,
    pub error: Option<String>,
    pub result: Option<AnalysisResultView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResultView {
    pub best_config_name: String,
    pub sections: Vec<AnalysisSection>,
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSection {
    pub title: &'static str,
    pub items: Vec<String>,
    /// Placeholder shown instead of an empty list.
    pub empty_message: Option<&'static str>,
}

impl AnalysisSection {
    fn new(title: &'static str, items: &[String]) -> Self {
        Self {
            title,
            items: items.to_vec(),
            empty_message: items.is_empty().then_some(EMPTY_SECTION),
        }
    }
}

impl From<&AnalysisResult> for AnalysisResultView {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            best_config_name: result
                .resolved_best_config()
                .map_or_else(|| format_score(None), str::to_string),
            sections: vec![
                AnalysisSection::new("Strengths", &result.strengths),
                AnalysisSection::new("Weaknesses", &result.weaknesses),
                AnalysisSection::new("Documentation Gaps", &result.documentation_gaps),
                AnalysisSection::new("Recommendations", &result.recommendations),
            ],
            reasoning: result.reasoning.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Auto-tune
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct AutoTuneView {
    pub phase: &'static str,
    /// The start control is disabled.
    pub busy: bool,
    pub status: Option<String>,
    pub error: Option<String>,
    pub result: Option<AutoTuneRunView>,
    pub history_loading: bool,
    pub history_error: Option<String>,
    pub history_empty_message: Option<String>,
    pub history: Vec<AutoTuneRunView>,
    pub selected_index: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoTuneRunView {
    pub auto_tune_run_id: Option<String>,
    pub created_at: Option<String>,
    pub starting_score: String,
    pub final_score: String,
    pub iterations: String,
    pub reason_stopped: Option<String>,
    pub history: Vec<IterationView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IterationView {
    pub iteration: u32,
    pub pipeline_config_id: String,
    pub pipeline_config_name: String,
    pub avg_overall: String,
    pub improvement: String,
}

impl From<&AutoTuneRun> for AutoTuneRunView {
    fn from(run: &AutoTuneRun) -> Self {
        Self {
            auto_tune_run_id: run.resolved_run_id().map(str::to_string),
            created_at: run.created_at.clone(),
            starting_score: format_score(run.resolved_starting_score()),
            final_score: format_score(run.resolved_final_score()),
            iterations: count_noun(run.iteration_count(), "iteration", "iterations"),
            reason_stopped: run.reason_stopped.clone(),
            history: run
                .history
                .iter()
                .map(|it| IterationView {
                    iteration: it.iteration,
                    pipeline_config_id: it.pipeline_config_id.clone(),
                    pipeline_config_name: it.pipeline_config_name.clone(),
                    avg_overall: format_score(it.avg_overall),
                    improvement: format_delta(it.improvement_from_previous),
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Live query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct LiveQueryView {
    pub question: String,
    pub loading: bool,
    pub error: Option<String>,
    pub answer: Option<String>,
    pub contexts: Vec<Value>,
    pub latency_ms: Option<String>,
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

impl DashboardView {
    pub fn build(dashboard: &Dashboard) -> Self {
        let active = dashboard.router().active();
        let selected = dashboard.selection().selected_eval_run_id();

        let browser = dashboard.browser();
        let eval_viewer = EvalViewerView {
            loading: browser.is_loading(),
            error: browser.error().map(str::to_string),
            notice: browser.notice().map(str::to_string),
            empty_message: browser
                .is_empty_state()
                .then(|| EMPTY_RUNS_MESSAGE.to_string()),
            runs: browser
                .entries()
                .iter()
                .map(|entry| RunRow::new(&entry.run, Some(entry.serial), selected))
                .collect(),
            selected_eval_run_id: selected.map(str::to_string),
            detail: DetailView::from_state(dashboard.selection().detail()),
        };

        let board = dashboard.leaderboard();
        let serials: HashMap<String, u32> = assign_serials(board.rows().to_vec())
            .into_iter()
            .map(|entry| (entry.run.eval_run_id, entry.serial))
            .collect();
        let leaderboard = LeaderboardView {
            loading: board.is_loading(),
            error: board.error().map(str::to_string),
            empty_message: (board.is_loaded() && board.rows().is_empty())
                .then(|| EMPTY_RUNS_MESSAGE.to_string()),
            rows: board
                .rows()
                .iter()
                .map(|run| RunRow::new(run, serials.get(&run.eval_run_id).copied(), selected))
                .collect(),
        };

        let orch = dashboard.analysis();
        let analysis = AnalysisView {
            state: match orch.state() {
                AnalysisState::Idle => "idle",
                AnalysisState::Analyzing => "analyzing",
                AnalysisState::Succeeded(_) => "succeeded",
                AnalysisState::Failed(_) => "failed",
            },
            target: orch
                .target()
                .or_else(|| dashboard.analysis_fallback())
                .map(str::to_string),
            enabled: dashboard.can_analyze(),
            error: orch.error().map(str::to_string),
            result: orch.result().map(AnalysisResultView::from),
        };

        let ctl = dashboard.autotune();
        let auto_tune = AutoTuneView {
            phase: ctl.phase().as_str(),
            busy: ctl.phase().is_busy(),
            status: ctl.status().map(str::to_string),
            error: ctl.error().map(str::to_string),
            result: ctl.result().map(AutoTuneRunView::from),
            history_loading: ctl.history_loading(),
            history_error: ctl.history_error().map(str::to_string),
            history_empty_message: (ctl.history_loaded() && ctl.history().is_empty())
                .then(|| EMPTY_HISTORY_MESSAGE.to_string()),
            history: ctl.history().iter().map(AutoTuneRunView::from).collect(),
            selected_index: dashboard.selection().selected_auto_tune_index(),
        };

        let form = dashboard.live_query();
        let live_query = LiveQueryView {
            question: form.question().to_string(),
            loading: form.is_loading(),
            error: form.error().map(str::to_string),
            answer: form.response().map(|r| r.answer.clone()),
            contexts: form.response().map(|r| r.contexts.clone()).unwrap_or_default(),
            latency_ms: form
                .response()
                .and_then(|r| r.latency_ms)
                .map(|ms| format!("{ms:.0}")),
        };

        Self {
            active_tab: active,
            tabs: Tab::ALL
                .into_iter()
                .map(|tab| TabView {
                    slug: tab.slug(),
                    title: tab.title(),
                    active: tab == active,
                })
                .collect(),
            eval_viewer,
            leaderboard,
            analysis,
            auto_tune,
            live_query,
            global_error: dashboard.global_error().map(str::to_string),
        }
    }

    /// The auto-tune history entry currently selected, if any.
    pub fn selected_auto_tune_run(&self) -> Option<&AutoTuneRunView> {
        self.auto_tune
            .selected_index
            .and_then(|index| self.auto_tune.history.get(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn analysis_sections_use_placeholder_for_empty_lists() {
        let result = AnalysisResult {
            strengths: vec!["x".to_string()],
            recommendations: vec!["y".to_string()],
            ..AnalysisResult::default()
        };
        let view = AnalysisResultView::from(&result);

        assert_eq!(view.sections[0].items, vec!["x".to_string()]);
        assert_eq!(view.sections[0].empty_message, None);
        assert!(view.sections[1].items.is_empty());
        assert_eq!(view.sections[1].empty_message, Some(EMPTY_SECTION));
        assert_eq!(view.sections[3].items, vec!["y".to_string()]);
        assert_eq!(view.best_config_name, "N/A");
    }

    #[test]
    fn legacy_field_names_reach_the_view() {
        let result: AnalysisResult =
            serde_json::from_str(r#"{ "best_config": "baseline" }"#).unwrap();
        assert_eq!(AnalysisResultView::from(&result).best_config_name, "baseline");

        let run: EvalRun = serde_json::from_str(
            r#"{ "eval_run_id": "r1", "config_name": "a", "pipeline_config_name": "a" }"#,
        )
        .unwrap();
        assert_eq!(RunRow::new(&run, Some(1), None).config_name, "a");

        let row: EvalResultRow = serde_json::from_str(r#"{ "overall": 0.8333 }"#).unwrap();
        assert_eq!(ResultRowView::from(&row).overall, "0.83");

        let tuned: AutoTuneRun =
            serde_json::from_str(r#"{ "id": "t1", "final_best_score": 0.85 }"#).unwrap();
        let view = AutoTuneRunView::from(&tuned);
        assert_eq!(view.auto_tune_run_id.as_deref(), Some("t1"));
        assert_eq!(view.final_score, "0.85");
    }

    #[test]
    fn summary_metrics_format_numbers_and_keep_text() {
        let detail = EvalRunDetail {
            summary_metrics: [
                ("avg_overall".to_string(), json!(0.8333)),
                ("judge".to_string(), json!("gpt")),
                ("missing".to_string(), Value::Null),
            ]
            .into_iter()
            .collect(),
            ..EvalRunDetail::default()
        };
        let view = DetailView::loaded("r1", &detail);
        let pairs: Vec<(&str, &str)> = view
            .summary_metrics
            .iter()
            .map(|m| (m.name.as_str(), m.value.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("avg_overall", "0.83"), ("judge", "gpt"), ("missing", "N/A")]
        );
    }

    #[test]
    fn empty_detail_state_shows_prompt() {
        let view = DetailView::from_state(&DetailState::Empty);
        assert_eq!(view.state, "empty");
        assert_eq!(view.message.as_deref(), Some(DETAIL_PROMPT));
    }

    #[test]
    fn iteration_rows_format_scores_and_deltas() {
        let run = AutoTuneRun {
            history: vec![crate::api::AutoTuneIteration {
                iteration: 1,
                pipeline_config_id: "c1".to_string(),
                pipeline_config_name: "chunk-512".to_string(),
                avg_overall: Some(0.7777),
                improvement_from_previous: Some(0.05),
            }],
            ..AutoTuneRun::default()
        };
        let view = AutoTuneRunView::from(&run);
        assert_eq!(view.history[0].avg_overall, "0.78");
        assert_eq!(view.history[0].improvement, "+0.05");
        assert_eq!(view.iterations, "1 iteration");
        assert_eq!(view.final_score, "N/A");
    }
}
