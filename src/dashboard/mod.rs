//! The orchestration core: one named sub-store per dashboard component,
//! composed by [`Dashboard`].
//!
//! `Dashboard` never performs I/O. User actions go in through
//! [`Dashboard::dispatch`], backend answers through [`Dashboard::apply`];
//! both return the [`Request`]s the caller must execute next. Each sub-store
//! has exactly one writer (its own transition functions), and cross-store
//! effects are spelled out here.

pub mod analysis;
pub mod autotune;
pub mod browser;
pub mod effects;
pub mod format;
pub mod leaderboard;
pub mod live_query;
pub mod router;
pub mod selection;
pub mod view;

use crate::api::{AutoTuneRequest, EvalRun, EvalRunRequest, require_id};
use crate::config::schema::DefaultsConfig;

use analysis::{AnalysisOrchestrator, AnalysisOutcome};
use autotune::{AutoTuneController, AutoTuneOutcome};
use browser::{EvalRunBrowser, ListOutcome};
use effects::{Completion, ListScope, Request};
use leaderboard::Leaderboard;
use live_query::LiveQuery;
use router::{Reload, Tab, ViewRouter};
use selection::{DetailOutcome, SelectionStore};

pub use view::DashboardView;

/// Fixed identifiers and knobs sent with backend requests.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSettings {
    pub workspace_id: String,
    pub eval_set_id: String,
    pub max_iterations: u32,
    pub top_k: u32,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self::from(&DefaultsConfig::default())
    }
}

impl From<&DefaultsConfig> for DashboardSettings {
    fn from(defaults: &DefaultsConfig) -> Self {
        Self {
            workspace_id: defaults.workspace_id.clone(),
            eval_set_id: defaults.eval_set_id.clone(),
            max_iterations: defaults.max_iterations,
            top_k: defaults.top_k,
        }
    }
}

/// Everything a user can do to the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ActivateTab(Tab),
    SelectEvalRun { eval_run_id: String },
    SubmitEvalRun { pipeline_config_id: String },
    ChooseAnalysisTarget { eval_run_id: String },
    RunAnalysis,
    StartAutoTune { max_iterations: Option<u32> },
    SelectAutoTuneRun { index: usize },
    SubmitQuery { question: String, top_k: Option<u32> },
    ReloadEvalRuns,
    ReloadConfigs,
    ReloadAutoTuneHistory,
    ClearErrors,
}

#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    settings: DashboardSettings,
    router: ViewRouter,
    selection: SelectionStore,
    browser: EvalRunBrowser,
    leaderboard: Leaderboard,
    analysis: AnalysisOrchestrator,
    autotune: AutoTuneController,
    live_query: LiveQuery,
    /// Residual page-level error, shown in addition to the scoped ones.
    global_error: Option<String>,
}

impl Dashboard {
    pub fn new(settings: DashboardSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    pub fn router(&self) -> &ViewRouter {
        &self.router
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    pub fn browser(&self) -> &EvalRunBrowser {
        &self.browser
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn analysis(&self) -> &AnalysisOrchestrator {
        &self.analysis
    }

    pub fn autotune(&self) -> &AutoTuneController {
        &self.autotune
    }

    pub fn live_query(&self) -> &LiveQuery {
        &self.live_query
    }

    pub fn global_error(&self) -> Option<&str> {
        self.global_error.as_deref()
    }

    pub fn view(&self) -> DashboardView {
        DashboardView::build(self)
    }

    /// The run analysis falls back to when no target was chosen: the
    /// selected run, else the newest one known.
    pub fn analysis_fallback(&self) -> Option<&str> {
        self.selection
            .selected_eval_run_id()
            .or_else(|| self.leaderboard.newest().map(|run| run.eval_run_id.as_str()))
            .or_else(|| self.browser.newest().map(|run| run.eval_run_id.as_str()))
    }

    /// Whether the analyze control is enabled.
    pub fn can_analyze(&self) -> bool {
        !self.analysis.is_busy()
            && (self.analysis.target().is_some() || self.analysis_fallback().is_some())
    }

    // -----------------------------------------------------------------------
    // User actions
    // -----------------------------------------------------------------------

    pub fn dispatch(&mut self, action: Action) -> Vec<Request> {
        match action {
            Action::ActivateTab(tab) => self
                .router
                .activate(tab)
                .into_iter()
                .map(|reload| self.reload(reload))
                .collect(),
            Action::SelectEvalRun { eval_run_id } => self.select_eval_run(&eval_run_id),
            Action::SubmitEvalRun { pipeline_config_id } => {
                match require_id("pipeline_config_id", &pipeline_config_id) {
                    Ok(id) => vec![Request::SubmitEvalRun(EvalRunRequest {
                        eval_set_id: self.settings.eval_set_id.clone(),
                        pipeline_config_id: id.to_string(),
                    })],
                    Err(e) => {
                        self.browser.set_error(e.to_string());
                        Vec::new()
                    }
                }
            }
            Action::ChooseAnalysisTarget { eval_run_id } => {
                if !eval_run_id.trim().is_empty() {
                    self.analysis.choose_target(eval_run_id.trim());
                }
                Vec::new()
            }
            Action::RunAnalysis => self.run_analysis(),
            Action::StartAutoTune { max_iterations } => {
                let request = AutoTuneRequest {
                    workspace_id: self.settings.workspace_id.clone(),
                    eval_set_id: self.settings.eval_set_id.clone(),
                    max_iterations: max_iterations.unwrap_or(self.settings.max_iterations),
                };
                let started: Vec<Request> = self.autotune.start(request).into_iter().collect();
                if !started.is_empty() {
                    self.global_error = None;
                }
                started
            }
            Action::SelectAutoTuneRun { index } => {
                self.selection
                    .select_auto_tune_index(index, self.autotune.history().len());
                Vec::new()
            }
            Action::SubmitQuery { question, top_k } => self
                .live_query
                .submit(
                    &self.settings.workspace_id,
                    &question,
                    top_k.unwrap_or(self.settings.top_k),
                )
                .into_iter()
                .collect(),
            Action::ReloadEvalRuns => vec![self.reload(Reload::EvalRuns)],
            Action::ReloadConfigs => vec![self.reload(Reload::Configs)],
            Action::ReloadAutoTuneHistory => vec![self.reload(Reload::AutoTuneHistory)],
            Action::ClearErrors => {
                self.global_error = None;
                self.browser.clear_messages();
                self.leaderboard.clear_error();
                self.analysis.clear_error();
                self.autotune.clear_error();
                self.live_query.clear_error();
                Vec::new()
            }
        }
    }

    fn reload(&mut self, reload: Reload) -> Request {
        match reload {
            Reload::EvalRuns => self.browser.begin_load(&self.settings.eval_set_id),
            Reload::Configs => self.leaderboard.begin_load(&self.settings.eval_set_id),
            Reload::AutoTuneHistory => self
                .autotune
                .begin_history_load(&self.settings.workspace_id, &self.settings.eval_set_id),
        }
    }

    fn select_eval_run(&mut self, eval_run_id: &str) -> Vec<Request> {
        let eval_run_id = match require_id("eval_run_id", eval_run_id) {
            Ok(id) => id,
            Err(e) => {
                self.browser.set_error(e.to_string());
                return Vec::new();
            }
        };
        let run = self
            .browser
            .find(eval_run_id)
            .map(|entry| entry.run.clone())
            .or_else(|| self.leaderboard.find(eval_run_id).cloned())
            .unwrap_or_else(|| EvalRun::placeholder(eval_run_id));
        vec![self.select(run)]
    }

    fn select(&mut self, run: EvalRun) -> Request {
        self.analysis.choose_target(&run.eval_run_id);
        self.selection.select_eval_run(run)
    }

    fn run_analysis(&mut self) -> Vec<Request> {
        let fallback = self.analysis_fallback().map(str::to_string);
        match self.analysis.start(fallback.as_deref()) {
            Ok(Some(request)) => {
                self.global_error = None;
                vec![request]
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                self.global_error = Some(e.to_string());
                Vec::new()
            }
        }
    }

    // -----------------------------------------------------------------------
    // Backend answers
    // -----------------------------------------------------------------------

    /// A request has been handed to the network.
    pub fn on_dispatched(&mut self, request: &Request) {
        if let Request::AutoTune(_) = request {
            self.autotune.on_dispatched();
        }
    }

    /// Apply one completion; returns follow-up requests.
    pub fn apply(&mut self, completion: Completion) -> Vec<Request> {
        match completion {
            Completion::RunList {
                scope: ListScope::Browser,
                seq,
                result,
            } => {
                if self.browser.apply_list(seq, result) == ListOutcome::Loaded {
                    return self.after_browser_load();
                }
                Vec::new()
            }
            Completion::RunList {
                scope: ListScope::Leaderboard,
                seq,
                result,
            } => {
                if self.leaderboard.apply_list(seq, result) == ListOutcome::Loaded
                    && let Some(id) = self.selection.selected_eval_run_id()
                    && let Some(run) = self.leaderboard.find(id).cloned()
                {
                    self.selection.refresh_selected(&run);
                }
                Vec::new()
            }
            Completion::RunDetail {
                eval_run_id,
                result,
            } => {
                match result {
                    Ok(detail) => {
                        self.selection.apply_detail(&eval_run_id, detail);
                    }
                    Err(e) => {
                        if self.selection.fail_detail(&eval_run_id) == DetailOutcome::Failed {
                            self.browser
                                .set_error(format!("Failed to load run detail: {e}"));
                        }
                    }
                }
                Vec::new()
            }
            Completion::EvalRunSubmitted {
                pipeline_config_id,
                result,
            } => match result {
                Ok(submitted) => {
                    self.browser.set_notice(format!(
                        "Started eval run {} for config {pipeline_config_id}.",
                        submitted.eval_run_id
                    ));
                    vec![self.reload(Reload::EvalRuns)]
                }
                Err(e) => {
                    self.browser
                        .set_error(format!("Failed to start eval run: {e}"));
                    Vec::new()
                }
            },
            Completion::Analysis {
                eval_run_id,
                result,
            } => {
                if let AnalysisOutcome::Failed(message) = self.analysis.apply(&eval_run_id, result)
                {
                    self.global_error = Some(message);
                }
                Vec::new()
            }
            Completion::Query { seq, result } => {
                self.live_query.apply(seq, result);
                Vec::new()
            }
            Completion::AutoTune { result } => match self.autotune.apply(result) {
                AutoTuneOutcome::Succeeded => vec![
                    self.reload(Reload::AutoTuneHistory),
                    self.reload(Reload::Configs),
                ],
                AutoTuneOutcome::Failed(message) => {
                    self.global_error = Some(message);
                    Vec::new()
                }
                AutoTuneOutcome::Stale => Vec::new(),
            },
            Completion::AutoTuneHistory { seq, result } => {
                if self.autotune.apply_history(seq, result) {
                    self.selection
                        .reconcile_auto_tune_index(self.autotune.history().len());
                }
                Vec::new()
            }
        }
    }

    /// Keep a still-listed selection (refreshing its metadata), otherwise
    /// auto-select the newest run.
    fn after_browser_load(&mut self) -> Vec<Request> {
        if let Some(id) = self.selection.selected_eval_run_id()
            && let Some(entry) = self.browser.find(id)
        {
            let run = entry.run.clone();
            self.selection.refresh_selected(&run);
            return Vec::new();
        }
        match self.browser.newest().cloned() {
            Some(newest) => vec![self.select(newest)],
            None => Vec::new(),
        }
    }
}
