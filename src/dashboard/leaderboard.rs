//! Config leaderboard: every run of the evaluation set ranked by its
//! overall judge score.

use std::cmp::Ordering;

use crate::api::{ApiError, EvalRun};

use super::browser::{ListOutcome, parse_created_at};
use super::effects::{ListScope, Request, Sequencer};

#[derive(Debug, Clone, Default)]
pub struct Leaderboard {
    rows: Vec<EvalRun>,
    loaded: bool,
    seq: Sequencer,
    error: Option<String>,
}

impl Leaderboard {
    /// Rows, best first.
    pub fn rows(&self) -> &[EvalRun] {
        &self.rows
    }

    pub fn newest(&self) -> Option<&EvalRun> {
        self.rows
            .iter()
            .max_by_key(|run| parse_created_at(run.created_at.as_deref()))
    }

    pub fn find(&self, eval_run_id: &str) -> Option<&EvalRun> {
        self.rows.iter().find(|run| run.eval_run_id == eval_run_id)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_loading(&self) -> bool {
        self.seq.is_pending()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn begin_load(&mut self, eval_set_id: &str) -> Request {
        self.error = None;
        Request::ListRuns {
            scope: ListScope::Leaderboard,
            seq: self.seq.next(),
            eval_set_id: eval_set_id.to_string(),
        }
    }

    pub fn apply_list(&mut self, seq: u64, result: Result<Vec<EvalRun>, ApiError>) -> ListOutcome {
        if !self.seq.accept(seq) {
            return ListOutcome::Stale;
        }
        match result {
            Ok(mut runs) => {
                rank(&mut runs);
                self.rows = runs;
                self.loaded = true;
                ListOutcome::Loaded
            }
            Err(e) => {
                self.error = Some(format!("Failed to load configs: {e}"));
                ListOutcome::Failed
            }
        }
    }
}

/// Sort by `avg_overall` descending; runs without a numeric score go last.
pub fn rank(runs: &mut [EvalRun]) {
    runs.sort_by(|a, b| match (a.avg_overall, b.avg_overall) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(id: &str, score: Option<f64>) -> EvalRun {
        EvalRun {
            avg_overall: score,
            ..EvalRun::placeholder(id)
        }
    }

    #[test]
    fn ranks_by_overall_with_missing_scores_last() {
        let mut runs = vec![
            scored("none", None),
            scored("low", Some(0.41)),
            scored("high", Some(0.92)),
            scored("mid", Some(0.75)),
        ];
        rank(&mut runs);
        let ids: Vec<&str> = runs.iter().map(|r| r.eval_run_id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid", "low", "none"]);
    }

    #[test]
    fn newest_uses_creation_time_not_rank() {
        let mut board = Leaderboard::default();
        let Request::ListRuns { seq, .. } = board.begin_load("set") else {
            panic!("expected list request");
        };
        let older = EvalRun {
            created_at: Some("2026-01-01T00:00:00Z".to_string()),
            ..scored("best", Some(0.9))
        };
        let newer = EvalRun {
            created_at: Some("2026-02-01T00:00:00Z".to_string()),
            ..scored("latest", Some(0.5))
        };
        board.apply_list(seq, Ok(vec![newer, older]));

        assert_eq!(board.rows()[0].eval_run_id, "best");
        assert_eq!(board.newest().map(|r| r.eval_run_id.as_str()), Some("latest"));
    }

    #[test]
    fn failure_keeps_rows_and_sets_error() {
        let mut board = Leaderboard::default();
        let Request::ListRuns { seq, .. } = board.begin_load("set") else {
            panic!("expected list request");
        };
        board.apply_list(seq, Ok(vec![scored("a", Some(0.5))]));
        let Request::ListRuns { seq, .. } = board.begin_load("set") else {
            panic!("expected list request");
        };
        board.apply_list(
            seq,
            Err(ApiError::Http {
                status: 500,
                body: "boom".to_string(),
            }),
        );
        assert_eq!(board.rows().len(), 1);
        assert!(board.error().unwrap().contains("HTTP 500"));
    }
}
