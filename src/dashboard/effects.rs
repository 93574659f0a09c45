//! Requests the dashboard asks the runtime to perform, and the tagged
//! completions the runtime hands back.
//!
//! Every request carries the tag its store needs to decide, on arrival,
//! whether the response still matches what the user is looking at: the
//! selected id for select-then-fetch patterns, a per-store sequence number
//! for list reloads.

use crate::api::{
    AnalysisResult, ApiError, AutoTuneRequest, AutoTuneRun, Backend, EvalRun, EvalRunDetail,
    EvalRunRequest, QueryRequest, QueryResponse, SubmittedEvalRun,
};

/// Which store a run-list response belongs to. Both hit the same endpoint
/// but are separate logical resources and are never coalesced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    Browser,
    Leaderboard,
}

/// A backend call the dashboard wants made.
#[derive(Debug, Clone)]
pub enum Request {
    ListRuns {
        scope: ListScope,
        seq: u64,
        eval_set_id: String,
    },
    RunDetail {
        eval_run_id: String,
    },
    SubmitEvalRun(EvalRunRequest),
    Analyze {
        eval_run_id: String,
    },
    Query {
        seq: u64,
        request: QueryRequest,
    },
    AutoTune(AutoTuneRequest),
    AutoTuneHistory {
        seq: u64,
        workspace_id: String,
        eval_set_id: String,
    },
}

/// The tagged outcome of a [`Request`].
#[derive(Debug, Clone)]
pub enum Completion {
    RunList {
        scope: ListScope,
        seq: u64,
        result: Result<Vec<EvalRun>, ApiError>,
    },
    RunDetail {
        eval_run_id: String,
        result: Result<EvalRunDetail, ApiError>,
    },
    EvalRunSubmitted {
        pipeline_config_id: String,
        result: Result<SubmittedEvalRun, ApiError>,
    },
    Analysis {
        eval_run_id: String,
        result: Result<AnalysisResult, ApiError>,
    },
    Query {
        seq: u64,
        result: Result<QueryResponse, ApiError>,
    },
    AutoTune {
        result: Result<AutoTuneRun, ApiError>,
    },
    AutoTuneHistory {
        seq: u64,
        result: Result<Vec<AutoTuneRun>, ApiError>,
    },
}

impl Request {
    /// Stable operation name, used for the activity log.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::ListRuns { .. } => "list_runs",
            Self::RunDetail { .. } => "run_detail",
            Self::SubmitEvalRun(_) => "submit_eval_run",
            Self::Analyze { .. } => "analyze",
            Self::Query { .. } => "query",
            Self::AutoTune(_) => "auto_tune",
            Self::AutoTuneHistory { .. } => "auto_tune_history",
        }
    }

    /// What the request is about, for the activity log.
    pub fn target(&self) -> String {
        match self {
            Self::ListRuns { eval_set_id, .. } => eval_set_id.clone(),
            Self::RunDetail { eval_run_id } | Self::Analyze { eval_run_id } => eval_run_id.clone(),
            Self::SubmitEvalRun(req) => req.pipeline_config_id.clone(),
            Self::Query { request, .. } => request.question.chars().take(60).collect(),
            Self::AutoTune(req) => format!("{} x{}", req.eval_set_id, req.max_iterations),
            Self::AutoTuneHistory { eval_set_id, .. } => eval_set_id.clone(),
        }
    }

    /// Perform the call and tag the outcome. Blocks for the duration of the
    /// HTTP exchange.
    pub fn execute<B: Backend + ?Sized>(self, backend: &B) -> Completion {
        match self {
            Self::ListRuns {
                scope,
                seq,
                eval_set_id,
            } => Completion::RunList {
                scope,
                seq,
                result: backend.list_runs(&eval_set_id),
            },
            Self::RunDetail { eval_run_id } => {
                let result = backend.run_detail(&eval_run_id);
                Completion::RunDetail {
                    eval_run_id,
                    result,
                }
            }
            Self::SubmitEvalRun(request) => Completion::EvalRunSubmitted {
                result: backend.submit_eval_run(&request),
                pipeline_config_id: request.pipeline_config_id,
            },
            Self::Analyze { eval_run_id } => {
                let result = backend.analyze(&eval_run_id);
                Completion::Analysis {
                    eval_run_id,
                    result,
                }
            }
            Self::Query { seq, request } => Completion::Query {
                seq,
                result: backend.query(&request),
            },
            Self::AutoTune(request) => Completion::AutoTune {
                result: backend.auto_tune(&request),
            },
            Self::AutoTuneHistory {
                seq,
                workspace_id,
                eval_set_id,
            } => Completion::AutoTuneHistory {
                seq,
                result: backend.auto_tune_history(&workspace_id, &eval_set_id),
            },
        }
    }
}

impl Completion {
    /// The failure carried by this completion, if any.
    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Self::RunList { result, .. } => result.as_ref().err(),
            Self::RunDetail { result, .. } => result.as_ref().err(),
            Self::EvalRunSubmitted { result, .. } => result.as_ref().err(),
            Self::Analysis { result, .. } => result.as_ref().err(),
            Self::Query { result, .. } => result.as_ref().err(),
            Self::AutoTune { result } => result.as_ref().err(),
            Self::AutoTuneHistory { result, .. } => result.as_ref().err(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sequencer
// ---------------------------------------------------------------------------

/// Issues sequence numbers for list reloads and decides which responses are
/// still current.
///
/// A response is accepted only if it is newer than every response already
/// accepted, so a slow early reload can never overwrite a faster later one.
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    issued: u64,
    accepted: u64,
}

impl Sequencer {
    /// Tag for a new request.
    pub fn next(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Record a response; `false` means it is stale and must be dropped.
    pub fn accept(&mut self, seq: u64) -> bool {
        if seq > self.accepted && seq <= self.issued {
            self.accepted = seq;
            true
        } else {
            false
        }
    }

    /// Whether the most recently issued request has not been answered yet.
    pub fn is_pending(&self) -> bool {
        self.issued > self.accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequencer_drops_older_responses() {
        let mut seq = Sequencer::default();
        let first = seq.next();
        let second = seq.next();
        assert!(seq.is_pending());

        assert!(seq.accept(second));
        assert!(!seq.is_pending());
        assert!(!seq.accept(first));
    }

    #[test]
    fn sequencer_stays_pending_until_latest_arrives() {
        let mut seq = Sequencer::default();
        let first = seq.next();
        let _second = seq.next();

        assert!(seq.accept(first));
        assert!(seq.is_pending());
    }

    #[test]
    fn sequencer_rejects_unissued_tags() {
        let mut seq = Sequencer::default();
        assert!(!seq.accept(1));
    }

    #[test]
    fn request_operation_names_are_stable() {
        let req = Request::RunDetail {
            eval_run_id: "r1".to_string(),
        };
        assert_eq!(req.operation(), "run_detail");
        assert_eq!(req.target(), "r1");
    }
}
