use thiserror::Error;

use crate::core::config::ConfigError;
use crate::core::errors::RagError;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to load vector index: {0}")]
    Index(#[source] RagError),

    #[error(
        "Index was built with embedding model '{index}' but '{configured}' is configured; rebuild the index"
    )]
    EmbeddingModelMismatch { index: String, configured: String },
}
