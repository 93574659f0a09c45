/// Wire types for the evaluation/optimization backend.
///
/// Every type here is a read-only snapshot of backend state. Unknown fields
/// are ignored and most fields are optional, so older and newer backend
/// versions both decode. Score fields are deliberately lenient: anything that
/// is not a finite JSON number (missing, `null`, a string) decodes to `None`
/// and renders as `N/A`.
use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// An aggregate or per-question judge score. `None` means "not numeric".
pub type Score = Option<f64>;

/// Decode a score, mapping every non-numeric value to `None`.
pub fn lenient_score<'de, D>(deserializer: D) -> Result<Score, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|f| f.is_finite()))
}

// ---------------------------------------------------------------------------
// Pipeline configs and eval runs
// ---------------------------------------------------------------------------

/// How a pipeline config came into existence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigOrigin {
    Manual,
    AgentSuggested,
    SystemGenerated,
    #[default]
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::AgentSuggested => write!(f, "agent_suggested"),
            Self::SystemGenerated => write!(f, "system_generated"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// One execution of an evaluation set against a pipeline config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalRun {
    pub eval_run_id: String,
    #[serde(default)]
    pub config_name: String,
    #[serde(default)]
    pub config_id: Option<String>,
    /// Older backends name the config fields after the pipeline config.
    /// Some send both spellings, so they decode separately.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_config_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_config_id: Option<String>,
    #[serde(default)]
    pub origin: ConfigOrigin,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub avg_overall: Score,
    #[serde(default, deserialize_with = "lenient_score")]
    pub avg_relevance: Score,
    #[serde(default, deserialize_with = "lenient_score")]
    pub avg_faithfulness: Score,
    #[serde(default, deserialize_with = "lenient_score")]
    pub avg_completeness: Score,
    #[serde(default)]
    pub completed: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
}

impl EvalRun {
    /// A run known only by id, used when a run is selected before any list
    /// containing it has loaded.
    pub fn placeholder(eval_run_id: &str) -> Self {
        Self {
            eval_run_id: eval_run_id.to_string(),
            config_name: String::new(),
            config_id: None,
            pipeline_config_name: None,
            pipeline_config_id: None,
            origin: ConfigOrigin::Unknown,
            created_at: None,
            status: None,
            avg_overall: None,
            avg_relevance: None,
            avg_faithfulness: None,
            avg_completeness: None,
            completed: None,
            total: None,
        }
    }

    /// Config name, whichever spelling the backend used.
    pub fn resolved_config_name(&self) -> &str {
        if self.config_name.is_empty() {
            self.pipeline_config_name.as_deref().unwrap_or_default()
        } else {
            &self.config_name
        }
    }

    pub fn resolved_config_id(&self) -> Option<&str> {
        self.config_id
            .as_deref()
            .or(self.pipeline_config_id.as_deref())
    }
}

/// Response of `GET /eval/runs/compare`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunListResponse {
    #[serde(default)]
    pub runs: Vec<EvalRun>,
}

/// One judged question inside an eval run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EvalResultRow {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub judge_explanation: String,
    #[serde(default, deserialize_with = "lenient_score")]
    pub overall_score: Score,
    #[serde(default, deserialize_with = "lenient_score")]
    pub relevance_score: Score,
    #[serde(default, deserialize_with = "lenient_score")]
    pub faithfulness_score: Score,
    #[serde(default, deserialize_with = "lenient_score")]
    pub completeness_score: Score,
    /// Short score names used by some judge versions.
    #[serde(default, deserialize_with = "lenient_score", skip_serializing_if = "Option::is_none")]
    pub overall: Score,
    #[serde(default, deserialize_with = "lenient_score", skip_serializing_if = "Option::is_none")]
    pub relevance: Score,
    #[serde(default, deserialize_with = "lenient_score", skip_serializing_if = "Option::is_none")]
    pub faithfulness: Score,
    #[serde(default, deserialize_with = "lenient_score", skip_serializing_if = "Option::is_none")]
    pub completeness: Score,
}

impl EvalResultRow {
    pub fn resolved_overall(&self) -> Score {
        self.overall_score.or(self.overall)
    }

    pub fn resolved_relevance(&self) -> Score {
        self.relevance_score.or(self.relevance)
    }

    pub fn resolved_faithfulness(&self) -> Score {
        self.faithfulness_score.or(self.faithfulness)
    }

    pub fn resolved_completeness(&self) -> Score {
        self.completeness_score.or(self.completeness)
    }
}

/// Response of `GET /eval/runs/{id}/results`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EvalRunDetail {
    #[serde(default)]
    pub pipeline_config_name: String,
    #[serde(default)]
    pub eval_set_name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub summary_metrics: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub results: Vec<EvalResultRow>,
}

/// Request body for `POST /eval/run`.
#[derive(Debug, Clone, Serialize)]
pub struct EvalRunRequest {
    pub eval_set_id: String,
    pub pipeline_config_id: String,
}

/// Response of `POST /eval/run`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubmittedEvalRun {
    pub eval_run_id: String,
}

// ---------------------------------------------------------------------------
// Agent analysis
// ---------------------------------------------------------------------------

/// Request body for `POST /agent/analyze`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRequest {
    pub eval_run_id: String,
}

/// LLM assessment of a single eval run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub best_config_name: Option<String>,
    /// Name used by earlier agent versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_config: Option<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub documentation_gaps: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

impl AnalysisResult {
    pub fn resolved_best_config(&self) -> Option<&str> {
        self.best_config_name
            .as_deref()
            .or(self.best_config.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Live query
// ---------------------------------------------------------------------------

/// Request body for `POST /query`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest {
    pub workspace_id: String,
    pub question: String,
    pub top_k: u32,
}

/// Response of `POST /query`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub contexts: Vec<serde_json::Value>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub latency_ms: Option<f64>,
}

// ---------------------------------------------------------------------------
// Auto-tune
// ---------------------------------------------------------------------------

/// Request body for `POST /agent/auto-tune`.
#[derive(Debug, Clone, Serialize)]
pub struct AutoTuneRequest {
    pub workspace_id: String,
    pub eval_set_id: String,
    pub max_iterations: u32,
}

/// One candidate evaluated by the tuning loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoTuneIteration {
    #[serde(default)]
    pub iteration: u32,
    #[serde(default)]
    pub pipeline_config_id: String,
    #[serde(default)]
    pub pipeline_config_name: String,
    #[serde(default, deserialize_with = "lenient_score")]
    pub avg_overall: Score,
    #[serde(default, deserialize_with = "lenient_score")]
    pub improvement_from_previous: Score,
}

/// One full invocation of the tuning loop, live or from history.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AutoTuneRun {
    #[serde(default)]
    pub auto_tune_run_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub starting_score: Score,
    #[serde(default, deserialize_with = "lenient_score")]
    pub final_score: Score,
    /// History rows carry the stored record's column names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_score", skip_serializing_if = "Option::is_none")]
    pub starting_best_score: Score,
    #[serde(default, deserialize_with = "lenient_score", skip_serializing_if = "Option::is_none")]
    pub final_best_score: Score,
    #[serde(default)]
    pub total_iterations: Option<u32>,
    #[serde(default)]
    pub history: Vec<AutoTuneIteration>,
    #[serde(default)]
    pub reason_stopped: Option<String>,
}

impl AutoTuneRun {
    pub fn resolved_run_id(&self) -> Option<&str> {
        self.auto_tune_run_id.as_deref().or(self.id.as_deref())
    }

    pub fn resolved_starting_score(&self) -> Score {
        self.starting_score.or(self.starting_best_score)
    }

    pub fn resolved_final_score(&self) -> Score {
        self.final_score.or(self.final_best_score)
    }

    /// Iteration count reported by the backend, or the history length when
    /// the backend omitted it.
    pub fn iteration_count(&self) -> u32 {
        self.total_iterations
            .unwrap_or_else(|| u32::try_from(self.history.len()).unwrap_or(u32::MAX))
    }
}

/// Response of `GET /agent/auto-tune/history`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AutoTuneHistoryResponse {
    #[serde(default)]
    pub runs: Vec<AutoTuneRun>,
}
