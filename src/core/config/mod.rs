pub mod paths;
pub mod service;
pub mod validation;

pub use paths::AppPaths;
pub use service::{
    AppConfig, ChunkingConfig, ConfigError, ConfigService, EmbeddingBackend, EmbeddingConfig,
    GenerationConfig, IndexConfig, RetrievalConfig, ServerConfig,
};
