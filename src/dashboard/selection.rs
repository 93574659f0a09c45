//! Selection store: which eval run and which auto-tune history entry are
//! selected, independent of the active tab.
//!
//! Detail fetches are tagged with the eval run id that caused them. A
//! response is applied only while that id is still the live selection;
//! anything else is a late answer to an abandoned click and is dropped.

use crate::api::{EvalRun, EvalRunDetail};

use super::effects::Request;

/// What the detail pane currently holds.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DetailState {
    /// Nothing selected yet.
    #[default]
    Empty,
    /// Placeholder while the selected run's detail is in flight.
    Loading { eval_run_id: String },
    /// Detail rows of the selected run.
    Loaded {
        eval_run_id: String,
        detail: EvalRunDetail,
    },
    /// The fetch for the selected run failed; the error is shown by the
    /// eval viewer.
    Unavailable { eval_run_id: String },
}

/// Result of offering a detail response to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailOutcome {
    Applied,
    Failed,
    Stale,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionStore {
    eval_run: Option<EvalRun>,
    detail: DetailState,
    auto_tune_index: Option<usize>,
}

impl SelectionStore {
    pub fn selected_eval_run(&self) -> Option<&EvalRun> {
        self.eval_run.as_ref()
    }

    pub fn selected_eval_run_id(&self) -> Option<&str> {
        self.eval_run.as_ref().map(|run| run.eval_run_id.as_str())
    }

    pub fn detail(&self) -> &DetailState {
        &self.detail
    }

    pub fn selected_auto_tune_index(&self) -> Option<usize> {
        self.auto_tune_index
    }

    /// Select `run`, swap the detail pane to a loading placeholder and
    /// return the tagged detail fetch.
    pub fn select_eval_run(&mut self, run: EvalRun) -> Request {
        let eval_run_id = run.eval_run_id.clone();
        self.detail = DetailState::Loading {
            eval_run_id: eval_run_id.clone(),
        };
        self.eval_run = Some(run);
        Request::RunDetail { eval_run_id }
    }

    /// Replace the stored run metadata (e.g. after a list reload) without
    /// touching the detail pane. Ignored unless `run` is the selected one.
    pub fn refresh_selected(&mut self, run: &EvalRun) {
        if self.selected_eval_run_id() == Some(run.eval_run_id.as_str()) {
            self.eval_run = Some(run.clone());
        }
    }

    /// Offer a successful detail response.
    pub fn apply_detail(&mut self, eval_run_id: &str, detail: EvalRunDetail) -> DetailOutcome {
        if !self.is_live(eval_run_id) {
            return DetailOutcome::Stale;
        }
        self.detail = DetailState::Loaded {
            eval_run_id: eval_run_id.to_string(),
            detail,
        };
        DetailOutcome::Applied
    }

    /// Offer a failed detail response.
    pub fn fail_detail(&mut self, eval_run_id: &str) -> DetailOutcome {
        if !self.is_live(eval_run_id) {
            return DetailOutcome::Stale;
        }
        self.detail = DetailState::Unavailable {
            eval_run_id: eval_run_id.to_string(),
        };
        DetailOutcome::Failed
    }

    fn is_live(&self, eval_run_id: &str) -> bool {
        self.selected_eval_run_id() == Some(eval_run_id)
    }

    /// Select an auto-tune history entry. Purely local: history payloads
    /// arrive complete, so no fetch is needed. Out-of-range indices are
    /// rejected.
    pub fn select_auto_tune_index(&mut self, index: usize, history_len: usize) -> bool {
        if index < history_len {
            self.auto_tune_index = Some(index);
            true
        } else {
            false
        }
    }

    /// Keep the auto-tune selection valid after the history was replaced:
    /// default to the first entry, clamp past-the-end selections.
    pub fn reconcile_auto_tune_index(&mut self, history_len: usize) {
        self.auto_tune_index = match (self.auto_tune_index, history_len) {
            (_, 0) => None,
            (Some(index), len) if index < len => Some(index),
            (Some(_), len) => Some(len - 1),
            (None, _) => Some(0),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(id: &str) -> EvalRun {
        EvalRun {
            config_name: format!("config-{id}"),
            ..EvalRun::placeholder(id)
        }
    }

    fn detail(name: &str) -> EvalRunDetail {
        EvalRunDetail {
            pipeline_config_name: name.to_string(),
            ..EvalRunDetail::default()
        }
    }

    #[test]
    fn selecting_sets_loading_placeholder_and_tags_request() {
        let mut store = SelectionStore::default();
        let request = store.select_eval_run(run("a"));

        assert!(matches!(request, Request::RunDetail { ref eval_run_id } if eval_run_id == "a"));
        assert_eq!(
            store.detail(),
            &DetailState::Loading {
                eval_run_id: "a".to_string()
            }
        );
    }

    #[test]
    fn late_response_for_previous_selection_is_dropped() {
        let mut store = SelectionStore::default();
        store.select_eval_run(run("a"));
        store.select_eval_run(run("b"));

        assert_eq!(store.apply_detail("b", detail("B")), DetailOutcome::Applied);
        assert_eq!(store.apply_detail("a", detail("A")), DetailOutcome::Stale);

        match store.detail() {
            DetailState::Loaded { eval_run_id, detail } => {
                assert_eq!(eval_run_id, "b");
                assert_eq!(detail.pipeline_config_name, "B");
            }
            other => panic!("unexpected detail state: {other:?}"),
        }
    }

    #[test]
    fn stale_failure_does_not_touch_current_detail() {
        let mut store = SelectionStore::default();
        store.select_eval_run(run("a"));
        store.select_eval_run(run("b"));

        assert_eq!(store.fail_detail("a"), DetailOutcome::Stale);
        assert!(matches!(store.detail(), DetailState::Loading { .. }));

        assert_eq!(store.fail_detail("b"), DetailOutcome::Failed);
        assert!(matches!(store.detail(), DetailState::Unavailable { .. }));
    }

    #[test]
    fn refresh_only_touches_the_selected_run() {
        let mut store = SelectionStore::default();
        store.select_eval_run(run("a"));

        let mut updated = run("a");
        updated.status = Some("completed".to_string());
        store.refresh_selected(&updated);
        store.refresh_selected(&run("z"));

        assert_eq!(store.selected_eval_run_id(), Some("a"));
        assert_eq!(
            store.selected_eval_run().and_then(|r| r.status.as_deref()),
            Some("completed")
        );
        assert!(matches!(store.detail(), DetailState::Loading { .. }));
    }

    #[test]
    fn auto_tune_index_is_bounds_checked() {
        let mut store = SelectionStore::default();
        assert!(!store.select_auto_tune_index(0, 0));
        assert!(store.select_auto_tune_index(2, 3));
        assert_eq!(store.selected_auto_tune_index(), Some(2));
        assert!(!store.select_auto_tune_index(3, 3));
        assert_eq!(store.selected_auto_tune_index(), Some(2));
    }

    #[test]
    fn reconcile_defaults_and_clamps() {
        let mut store = SelectionStore::default();
        store.reconcile_auto_tune_index(4);
        assert_eq!(store.selected_auto_tune_index(), Some(0));

        store.select_auto_tune_index(3, 4);
        store.reconcile_auto_tune_index(2);
        assert_eq!(store.selected_auto_tune_index(), Some(1));

        store.reconcile_auto_tune_index(0);
        assert_eq!(store.selected_auto_tune_index(), None);
    }
}
