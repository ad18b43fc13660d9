use std::path::PathBuf;
use std::sync::Arc;

use crate::chat::ChatOrchestrator;
use crate::core::config::{AppConfig, AppPaths, ConfigService, EmbeddingBackend};
use crate::llm::{
    AnswerGenerator, EmbeddingProvider, GeminiEmbedder, GeminiGenerator, OpenAiCompatibleEmbedder,
};
use crate::rag::{FlatIndex, VectorIndex};

pub mod error;

use error::InitializationError;

/// Global application state shared across all routes.
///
/// Holds the loaded configuration and the chat orchestrator, whose
/// collaborators (embedder, index, generator) are read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: Arc<AppConfig>,
    pub chat: ChatOrchestrator,
}

impl AppState {
    /// Loads config, the Gemini key, the index and the model clients.
    ///
    /// Any failure here is fatal: the server must not start half-initialised.
    pub fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config_service = ConfigService::new(paths.clone());
        let config = config_service.load_config()?;
        let api_key = config_service.gemini_api_key()?;

        let embedder = build_embedder(&config, &api_key);
        tracing::info!(
            "Embedding provider '{}' ready (model {})",
            embedder.name(),
            embedder.model()
        );

        let index_dir = paths.resolve(&config.index.dir);
        let index = FlatIndex::load(&index_dir, config.index.allow_dangerous_deserialization)
            .map_err(InitializationError::Index)?;
        if index.embedding_model() != embedder.model() {
            return Err(InitializationError::EmbeddingModelMismatch {
                index: index.embedding_model().to_string(),
                configured: embedder.model().to_string(),
            });
        }
        tracing::info!(
            "Vector index loaded from {} ({} passages)",
            index_dir.display(),
            index.len()
        );

        let generator: Arc<dyn AnswerGenerator> = Arc::new(GeminiGenerator::new(
            api_key,
            &config.generation.base_url,
            config.generation.model.clone(),
        ));
        tracing::info!("Gemini model {} initialized", config.generation.model);

        let chat = ChatOrchestrator::new(embedder, Arc::new(index), generator)
            .with_retrieval(&config.retrieval);

        Ok(Self::from_parts(paths, config, chat))
    }

    /// Assembles state from already-built parts; tests inject fakes here.
    pub fn from_parts(paths: Arc<AppPaths>, config: AppConfig, chat: ChatOrchestrator) -> Arc<Self> {
        Arc::new(AppState {
            paths,
            config: Arc::new(config),
            chat,
        })
    }

    /// Index directory with relative config paths resolved against the working dir.
    pub fn index_dir(&self) -> PathBuf {
        self.paths.resolve(&self.config.index.dir)
    }

    pub fn log_dir(&self) -> &std::path::Path {
        &self.paths.log_dir
    }
}

/// Creates the configured embedding client.
pub fn build_embedder(config: &AppConfig, gemini_api_key: &str) -> Arc<dyn EmbeddingProvider> {
    let embedding = &config.embedding;
    match embedding.backend {
        EmbeddingBackend::Gemini => {
            let base_url = embedding
                .base_url
                .as_deref()
                .unwrap_or(&config.generation.base_url);
            Arc::new(GeminiEmbedder::new(
                gemini_api_key,
                base_url,
                embedding.model.clone(),
            ))
        }
        EmbeddingBackend::OpenaiCompatible => Arc::new(OpenAiCompatibleEmbedder::new(
            embedding.base_url.as_deref().unwrap_or_default(),
            embedding.model.clone(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AppConfig;

    #[test]
    fn gemini_embedder_model_is_normalised() {
        let mut config = AppConfig::default();
        config.embedding.model = "text-embedding-004".to_string();
        let embedder = build_embedder(&config, "key");
        assert_eq!(embedder.name(), "gemini");
        assert_eq!(embedder.model(), "models/text-embedding-004");
    }

    #[test]
    fn openai_embedder_keeps_model_verbatim() {
        let mut config = AppConfig::default();
        config.embedding.backend = EmbeddingBackend::OpenaiCompatible;
        config.embedding.base_url = Some("http://localhost:8080".to_string());
        config.embedding.model =
            "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2".to_string();
        let embedder = build_embedder(&config, "unused");
        assert_eq!(embedder.name(), "openai_compatible");
        assert_eq!(
            embedder.model(),
            "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2"
        );
    }
}
