//! Agent analysis of a single eval run.
//!
//! `Idle -> Analyzing -> Succeeded | Failed`. Choosing a different target
//! wipes whatever was shown for the previous one immediately, even while
//! its request is still in flight; that late response is then dropped.

use crate::api::{AnalysisResult, ApiError};

use super::effects::Request;

pub const NO_RUNS_MESSAGE: &str = "No eval runs found. Run an evaluation first.";

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AnalysisState {
    #[default]
    Idle,
    Analyzing,
    Succeeded(AnalysisResult),
    Failed(String),
}

/// What happened to an analysis response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Applied,
    Failed(String),
    Stale,
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisOrchestrator {
    target: Option<String>,
    in_flight: Option<String>,
    state: AnalysisState,
}

impl AnalysisOrchestrator {
    pub fn state(&self) -> &AnalysisState {
        &self.state
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// A request is outstanding; starting another one is disabled.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.state {
            AnalysisState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            AnalysisState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Drop a stored failure. An in-flight request is left alone.
    pub fn clear_error(&mut self) {
        if let AnalysisState::Failed(_) = self.state {
            self.state = AnalysisState::Idle;
        }
    }

    /// Point the orchestrator at `eval_run_id`. A change of target resets
    /// the state to `Idle` so no result is shown for the wrong run.
    pub fn choose_target(&mut self, eval_run_id: &str) {
        if self.target.as_deref() != Some(eval_run_id) {
            self.target = Some(eval_run_id.to_string());
            self.state = AnalysisState::Idle;
        }
    }

    /// Start analyzing the chosen target, or `fallback` when none was chosen.
    ///
    /// Returns `Ok(None)` while a request is already outstanding and
    /// `EmptyPrerequisite` when there is nothing to analyze.
    pub fn start(&mut self, fallback: Option<&str>) -> Result<Option<Request>, ApiError> {
        if self.is_busy() {
            return Ok(None);
        }
        let Some(eval_run_id) = self
            .target
            .clone()
            .or_else(|| fallback.map(str::to_string))
        else {
            self.state = AnalysisState::Failed(NO_RUNS_MESSAGE.to_string());
            return Err(ApiError::EmptyPrerequisite(NO_RUNS_MESSAGE.to_string()));
        };

        self.target = Some(eval_run_id.clone());
        self.in_flight = Some(eval_run_id.clone());
        self.state = AnalysisState::Analyzing;
        Ok(Some(Request::Analyze { eval_run_id }))
    }

    /// Offer an analysis response tagged with the run it was requested for.
    pub fn apply(
        &mut self,
        eval_run_id: &str,
        result: Result<AnalysisResult, ApiError>,
    ) -> AnalysisOutcome {
        if self.in_flight.as_deref() != Some(eval_run_id) {
            return AnalysisOutcome::Stale;
        }
        self.in_flight = None;

        let live = self.target.as_deref() == Some(eval_run_id)
            && self.state == AnalysisState::Analyzing;
        if !live {
            return AnalysisOutcome::Stale;
        }

        match result {
            Ok(result) => {
                self.state = AnalysisState::Succeeded(result);
                AnalysisOutcome::Applied
            }
            Err(e) => {
                let message = format!("Analysis failed: {e}");
                self.state = AnalysisState::Failed(message.clone());
                AnalysisOutcome::Failed(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(best: &str) -> AnalysisResult {
        AnalysisResult {
            best_config_name: Some(best.to_string()),
            ..AnalysisResult::default()
        }
    }

    #[test]
    fn start_without_any_run_is_an_empty_prerequisite() {
        let mut orch = AnalysisOrchestrator::default();
        let err = orch.start(None).unwrap_err();
        assert_eq!(err, ApiError::EmptyPrerequisite(NO_RUNS_MESSAGE.to_string()));
        assert_eq!(orch.error(), Some(NO_RUNS_MESSAGE));
        assert!(!orch.is_busy());
    }

    #[test]
    fn falls_back_to_the_given_run() {
        let mut orch = AnalysisOrchestrator::default();
        let request = orch.start(Some("newest")).unwrap();
        assert!(matches!(request, Some(Request::Analyze { ref eval_run_id }) if eval_run_id == "newest"));
        assert_eq!(orch.target(), Some("newest"));
        assert_eq!(orch.state(), &AnalysisState::Analyzing);
    }

    #[test]
    fn second_start_while_analyzing_is_a_no_op() {
        let mut orch = AnalysisOrchestrator::default();
        orch.choose_target("a");
        assert!(orch.start(None).unwrap().is_some());
        assert!(orch.start(None).unwrap().is_none());
    }

    #[test]
    fn changing_target_clears_previous_result() {
        let mut orch = AnalysisOrchestrator::default();
        orch.choose_target("x");
        orch.start(None).unwrap();
        assert_eq!(orch.apply("x", Ok(result("X"))), AnalysisOutcome::Applied);
        assert!(orch.result().is_some());

        orch.choose_target("y");
        assert!(orch.result().is_none());
        assert_eq!(orch.state(), &AnalysisState::Idle);
    }

    #[test]
    fn response_for_abandoned_target_is_dropped() {
        let mut orch = AnalysisOrchestrator::default();
        orch.choose_target("x");
        orch.start(None).unwrap();
        orch.choose_target("y");

        assert_eq!(orch.apply("x", Ok(result("X"))), AnalysisOutcome::Stale);
        assert!(orch.result().is_none());
        assert!(!orch.is_busy());

        let request = orch.start(None).unwrap();
        assert!(matches!(request, Some(Request::Analyze { ref eval_run_id }) if eval_run_id == "y"));
    }

    #[test]
    fn failure_is_stored_in_scoped_slot() {
        let mut orch = AnalysisOrchestrator::default();
        orch.choose_target("x");
        orch.start(None).unwrap();
        let outcome = orch.apply("x", Err(ApiError::Network("refused".to_string())));
        assert!(matches!(outcome, AnalysisOutcome::Failed(ref m) if m.contains("refused")));
        assert!(orch.error().unwrap().starts_with("Analysis failed"));
    }

    #[test]
    fn choosing_the_same_target_keeps_the_result() {
        let mut orch = AnalysisOrchestrator::default();
        orch.choose_target("x");
        orch.start(None).unwrap();
        orch.apply("x", Ok(result("X")));
        orch.choose_target("x");
        assert!(orch.result().is_some());
    }
}
