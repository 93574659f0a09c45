//! Live query form: ask the RAG pipeline one question.

use crate::api::{ApiError, QueryRequest, QueryResponse};

use super::effects::{Request, Sequencer};

pub const EMPTY_QUESTION_MESSAGE: &str = "Please enter a question.";

#[derive(Debug, Clone, Default)]
pub struct LiveQuery {
    question: String,
    seq: Sequencer,
    response: Option<QueryResponse>,
    error: Option<String>,
}

impl LiveQuery {
    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn response(&self) -> Option<&QueryResponse> {
        self.response.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn is_loading(&self) -> bool {
        self.seq.is_pending()
    }

    /// Validate and submit. A blank question never reaches the backend.
    pub fn submit(&mut self, workspace_id: &str, question: &str, top_k: u32) -> Option<Request> {
        self.question = question.to_string();
        let question = question.trim();
        if question.is_empty() {
            self.error = Some(ApiError::Validation(EMPTY_QUESTION_MESSAGE.to_string()).to_string());
            return None;
        }
        self.error = None;
        self.response = None;
        Some(Request::Query {
            seq: self.seq.next(),
            request: QueryRequest {
                workspace_id: workspace_id.to_string(),
                question: question.to_string(),
                top_k: top_k.max(1),
            },
        })
    }

    pub fn apply(&mut self, seq: u64, result: Result<QueryResponse, ApiError>) -> bool {
        if !self.seq.accept(seq) {
            return false;
        }
        match result {
            Ok(response) => self.response = Some(response),
            Err(e) => self.error = Some(format!("Query failed: {e}")),
        }
        true
    }
}
