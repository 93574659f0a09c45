//! Auto-tune controller and history browser.
//!
//! The backend runs the whole tuning loop inside one blocking call and
//! reports nothing until it finishes, so progress is narrated from the
//! request lifecycle alone:
//!
//! ```text
//! Idle --start--> Starting --dispatched--> Running --ok--> Succeeded
//!                                               \--err--> Failed
//! Succeeded | Failed --start--> Starting
//! ```
//!
//! `start` is ignored while `Starting` or `Running`.

use crate::api::{ApiError, AutoTuneRequest, AutoTuneRun};

use super::effects::{Request, Sequencer};
use super::format::{count_noun, format_score};

pub const STARTING_MESSAGE: &str = "Starting auto tune. The backend will re-evaluate the \
     baseline config, analyze its results, propose new configs, evaluate each candidate and \
     keep the best one.";

pub const RUNNING_MESSAGE: &str =
    "Auto tune is running. This may take several minutes; the page updates when it finishes.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoTunePhase {
    #[default]
    Idle,
    Starting,
    Running,
    Succeeded,
    Failed,
}

impl AutoTunePhase {
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Starting | Self::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

/// Outcome of a finished auto-tune call, as seen by the composite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoTuneOutcome {
    /// Success; reload history and the leaderboard.
    Succeeded,
    Failed(String),
    Stale,
}

#[derive(Debug, Clone, Default)]
pub struct AutoTuneController {
    phase: AutoTunePhase,
    status: Option<String>,
    error: Option<String>,
    /// Last successful result. Kept across a later failure, hidden while a
    /// new attempt is in flight.
    result: Option<AutoTuneRun>,

    history: Vec<AutoTuneRun>,
    history_loaded: bool,
    history_seq: Sequencer,
    history_error: Option<String>,
}

impl AutoTuneController {
    pub fn phase(&self) -> AutoTunePhase {
        self.phase
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
        self.history_error = None;
    }

    /// The result to display, if any.
    pub fn result(&self) -> Option<&AutoTuneRun> {
        if self.phase.is_busy() {
            None
        } else {
            self.result.as_ref()
        }
    }

    pub fn history(&self) -> &[AutoTuneRun] {
        &self.history
    }

    pub fn history_loaded(&self) -> bool {
        self.history_loaded
    }

    pub fn history_loading(&self) -> bool {
        self.history_seq.is_pending()
    }

    pub fn history_error(&self) -> Option<&str> {
        self.history_error.as_deref()
    }

    /// User pressed start. `None` while a run is already in flight.
    pub fn start(&mut self, request: AutoTuneRequest) -> Option<Request> {
        if self.phase.is_busy() {
            return None;
        }
        self.phase = AutoTunePhase::Starting;
        self.status = Some(STARTING_MESSAGE.to_string());
        self.error = None;
        Some(Request::AutoTune(request))
    }

    /// The start request has left; nothing more will be heard until the
    /// whole loop finishes.
    pub fn on_dispatched(&mut self) {
        if self.phase == AutoTunePhase::Starting {
            self.phase = AutoTunePhase::Running;
            self.status = Some(RUNNING_MESSAGE.to_string());
        }
    }

    pub fn apply(&mut self, result: Result<AutoTuneRun, ApiError>) -> AutoTuneOutcome {
        if !self.phase.is_busy() {
            return AutoTuneOutcome::Stale;
        }
        match result {
            Ok(run) => {
                self.status = Some(completion_status(&run));
                self.result = Some(run);
                self.phase = AutoTunePhase::Succeeded;
                AutoTuneOutcome::Succeeded
            }
            Err(e) => {
                let message = format!("Auto tune failed: {e}");
                self.status = Some(message.clone());
                self.error = Some(message.clone());
                self.phase = AutoTunePhase::Failed;
                AutoTuneOutcome::Failed(message)
            }
        }
    }

    pub fn begin_history_load(&mut self, workspace_id: &str, eval_set_id: &str) -> Request {
        self.history_error = None;
        Request::AutoTuneHistory {
            seq: self.history_seq.next(),
            workspace_id: workspace_id.to_string(),
            eval_set_id: eval_set_id.to_string(),
        }
    }

    /// Returns `true` when the history was replaced.
    pub fn apply_history(&mut self, seq: u64, result: Result<Vec<AutoTuneRun>, ApiError>) -> bool {
        if !self.history_seq.accept(seq) {
            return false;
        }
        match result {
            Ok(runs) => {
                self.history = runs;
                self.history_loaded = true;
                true
            }
            Err(e) => {
                self.history_error = Some(format!("Failed to load auto tune history: {e}"));
                false
            }
        }
    }
}

/// `Auto tune complete. Final score 0.85 after 3 iterations.`
pub fn completion_status(run: &AutoTuneRun) -> String {
    format!(
        "Auto tune complete. Final score {} after {}.",
        format_score(run.resolved_final_score()),
        count_noun(run.iteration_count(), "iteration", "iterations")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AutoTuneRequest {
        AutoTuneRequest {
            workspace_id: "ws".to_string(),
            eval_set_id: "set".to_string(),
            max_iterations: 3,
        }
    }

    fn finished(final_score: Option<f64>, iterations: u32) -> AutoTuneRun {
        AutoTuneRun {
            starting_score: Some(0.7),
            final_score,
            total_iterations: Some(iterations),
            ..AutoTuneRun::default()
        }
    }

    #[test]
    fn lifecycle_narrates_status() {
        let mut ctl = AutoTuneController::default();
        assert!(ctl.start(request()).is_some());
        assert_eq!(ctl.phase(), AutoTunePhase::Starting);
        assert_eq!(ctl.status(), Some(STARTING_MESSAGE));

        ctl.on_dispatched();
        assert_eq!(ctl.phase(), AutoTunePhase::Running);
        assert!(ctl.status().unwrap().contains("several minutes"));

        assert_eq!(ctl.apply(Ok(finished(Some(0.85), 3))), AutoTuneOutcome::Succeeded);
        assert_eq!(
            ctl.status(),
            Some("Auto tune complete. Final score 0.85 after 3 iterations.")
        );
    }

    #[test]
    fn start_is_ignored_while_busy() {
        let mut ctl = AutoTuneController::default();
        assert!(ctl.start(request()).is_some());
        assert!(ctl.start(request()).is_none());
        ctl.on_dispatched();
        assert!(ctl.start(request()).is_none());
    }

    #[test]
    fn restart_from_terminal_state() {
        let mut ctl = AutoTuneController::default();
        ctl.start(request());
        ctl.apply(Err(ApiError::Network("down".to_string())));
        assert_eq!(ctl.phase(), AutoTunePhase::Failed);
        assert!(ctl.start(request()).is_some());
        assert_eq!(ctl.phase(), AutoTunePhase::Starting);
        assert!(ctl.error().is_none());
    }

    #[test]
    fn failure_keeps_prior_success_visible() {
        let mut ctl = AutoTuneController::default();
        ctl.start(request());
        ctl.apply(Ok(finished(Some(0.85), 3)));

        ctl.start(request());
        assert!(ctl.result().is_none(), "hidden while a new attempt runs");

        let outcome = ctl.apply(Err(ApiError::Http {
            status: 502,
            body: String::new(),
        }));
        assert!(matches!(outcome, AutoTuneOutcome::Failed(ref m) if m == "Auto tune failed: HTTP 502"));
        assert_eq!(ctl.result().and_then(|r| r.final_score), Some(0.85));
    }

    #[test]
    fn non_numeric_final_score_renders_not_available() {
        assert_eq!(
            completion_status(&finished(None, 1)),
            "Auto tune complete. Final score N/A after 1 iteration."
        );
    }

    #[test]
    fn completion_without_pending_start_is_dropped() {
        let mut ctl = AutoTuneController::default();
        assert_eq!(ctl.apply(Ok(finished(Some(0.9), 1))), AutoTuneOutcome::Stale);
        assert!(ctl.result().is_none());
    }

    #[test]
    fn history_reloads_are_sequenced() {
        let mut ctl = AutoTuneController::default();
        let Request::AutoTuneHistory { seq: first, .. } = ctl.begin_history_load("ws", "set") else {
            panic!("expected history request");
        };
        let Request::AutoTuneHistory { seq: second, .. } = ctl.begin_history_load("ws", "set")
        else {
            panic!("expected history request");
        };

        assert!(ctl.apply_history(second, Ok(vec![AutoTuneRun::default(); 2])));
        assert!(!ctl.apply_history(first, Ok(vec![AutoTuneRun::default()])));
        assert_eq!(ctl.history().len(), 2);
        assert!(ctl.history_loaded());
    }
}
