//! Offline index construction: chunk, embed, assemble.

use std::sync::Arc;

use futures_util::{stream, StreamExt, TryStreamExt};

use super::chunking::RecursiveTextSplitter;
use crate::core::config::{ChunkingConfig, EmbeddingConfig};
use crate::core::errors::{RagError, RagResult};
use crate::llm::EmbeddingProvider;
use crate::rag::{FlatIndex, Passage};

pub struct IndexBuilder {
    splitter: RecursiveTextSplitter,
    embedder: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    concurrency: usize,
}

impl IndexBuilder {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        let chunking = ChunkingConfig::default();
        let embedding = EmbeddingConfig::default();
        Self {
            splitter: RecursiveTextSplitter::new(chunking.chunk_size, chunking.chunk_overlap),
            embedder,
            batch_size: embedding.batch_size,
            concurrency: embedding.concurrency,
        }
    }

    pub fn with_chunking(mut self, chunking: &ChunkingConfig) -> Self {
        self.splitter = RecursiveTextSplitter::new(chunking.chunk_size, chunking.chunk_overlap);
        self
    }

    pub fn with_batching(mut self, batch_size: usize, concurrency: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self.concurrency = concurrency.max(1);
        self
    }

    /// Splits `text` into passages tagged with `source` and their position.
    pub fn passages(&self, text: &str, source: &str) -> Vec<Passage> {
        self.splitter
            .split_text(text)
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| {
                let mut passage = Passage::new(format!("{source}_{i}"), chunk);
                passage
                    .metadata
                    .insert("source".to_string(), source.to_string());
                passage
                    .metadata
                    .insert("chunk_index".to_string(), i.to_string());
                passage
            })
            .collect()
    }

    /// Chunks and embeds `text`, producing an index ready to be saved.
    pub async fn build(&self, text: &str, source: &str) -> RagResult<FlatIndex> {
        let passages = self.passages(text, source);
        tracing::info!("Created {} chunks from {}", passages.len(), source);

        let batches: Vec<Vec<String>> = passages
            .chunks(self.batch_size)
            .map(|batch| batch.iter().map(|p| p.text.clone()).collect())
            .collect();
        let total_batches = batches.len();

        let embedded: Vec<Vec<Vec<f32>>> = stream::iter(batches.into_iter().enumerate())
            .map(|(i, batch)| {
                let embedder = self.embedder.clone();
                async move {
                    let vectors = embedder.embed_batch(&batch).await?;
                    tracing::info!("Embedded batch {}/{}", i + 1, total_batches);
                    Ok::<_, RagError>(vectors)
                }
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let embeddings = embedded.into_iter().flatten().collect();
        FlatIndex::from_embeddings(self.embedder.model(), passages, embeddings)
    }
}
