use serde::{Deserialize, Serialize};

pub const EMPTY_QUERY_ANSWER: &str = "Please provide a valid question.";
pub const NO_RESULTS_ANSWER: &str = "No relevant information found for your query.";
pub const FAILURE_ANSWER: &str = "Sorry, I encountered an error while processing your query.";

/// What the orchestrator hands back for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    /// Passages the answer was conditioned on.
    pub context: Option<String>,
    /// Diagnostic text of a recovered collaborator failure.
    pub error: Option<String>,
}

impl ChatResponse {
    pub fn message(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            context: None,
            error: None,
        }
    }

    pub fn answered(answer: String, context: String) -> Self {
        Self {
            answer,
            context: Some(context),
            error: None,
        }
    }

    pub fn failed(error: impl std::fmt::Display) -> Self {
        Self {
            answer: FAILURE_ANSWER.to_string(),
            context: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}
