//! Passage types and the `VectorIndex` trait the orchestrator searches through.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::errors::RagResult;

/// A stored chunk of the source corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Unique passage identifier.
    pub id: String,
    /// The text content of the passage.
    pub text: String,
    /// Source file, chunk index and similar provenance.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Passage {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: BTreeMap::new(),
        }
    }
}

/// Result of a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub passage: Passage,
    /// Cosine similarity (higher = better).
    pub score: f32,
}

/// Read-only similarity search over an immutable set of passages.
///
/// Implementations must return hits ordered best first and never more than `k`.
pub trait VectorIndex: Send + Sync {
    fn search(&self, query_embedding: &[f32], k: usize) -> RagResult<Vec<SearchHit>>;

    /// Number of stored passages.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
