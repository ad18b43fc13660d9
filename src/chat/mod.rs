//! Single-turn retrieval-augmented chat.

mod orchestrator;
mod types;

pub use orchestrator::ChatOrchestrator;
pub use types::{ChatResponse, EMPTY_QUERY_ANSWER, FAILURE_ANSWER, NO_RESULTS_ANSWER};
