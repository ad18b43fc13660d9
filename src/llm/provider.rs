use async_trait::async_trait;

use crate::core::errors::RagResult;

/// Maps text to a fixed-length vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// return the provider name (e.g. "gemini", "openai_compatible")
    fn name(&self) -> &str;

    /// identifier of the embedding model; recorded in the index manifest
    fn model(&self) -> &str;

    async fn embed(&self, text: &str) -> RagResult<Vec<f32>>;

    /// embed several texts; the default calls `embed` sequentially
    async fn embed_batch(&self, texts: &[String]) -> RagResult<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }
}

/// Hosted text generation.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> RagResult<String>;
}
