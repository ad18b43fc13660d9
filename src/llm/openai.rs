use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::EmbeddingProvider;
use crate::core::errors::{RagError, RagResult};

const PROVIDER: &str = "openai_compatible";

/// Embeddings from any server exposing `POST /v1/embeddings`
/// (text-embeddings-inference, LM Studio, llama.cpp server, ...).
#[derive(Clone)]
pub struct OpenAiCompatibleEmbedder {
    base_url: String,
    model: String,
    client: Client,
}

impl OpenAiCompatibleEmbedder {
    pub fn new(base_url: &str, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            client: Client::new(),
        }
    }

    async fn request(&self, inputs: &[String]) -> RagResult<Vec<Vec<f32>>> {
        let url = format!("{}/v1/embeddings", self.base_url);

        let body = json!({
            "model": self.model,
            "input": inputs,
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(embedding_error)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(embedding_error(format!("{}: {}", status, text)));
        }

        let payload: Value = res.json().await.map_err(embedding_error)?;
        let embeddings = parse_embeddings(&payload)?;
        if embeddings.len() != inputs.len() {
            return Err(embedding_error(format!(
                "requested {} embeddings, received {}",
                inputs.len(),
                embeddings.len()
            )));
        }
        Ok(embeddings)
    }
}

/// Reads `data[*].embedding`, honouring `index` when the server reorders items.
/// Items without a fully numeric embedding reject the whole response.
fn parse_embeddings(payload: &Value) -> RagResult<Vec<Vec<f32>>> {
    let Some(data) = payload["data"].as_array() else {
        return Ok(Vec::new());
    };

    let mut indexed = Vec::with_capacity(data.len());
    for (position, item) in data.iter().enumerate() {
        let values = item["embedding"]
            .as_array()
            .ok_or_else(|| embedding_error(format!("item {position} has no embedding array")))?;
        let vec = values
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32))
            .collect::<Option<Vec<f32>>>()
            .ok_or_else(|| {
                embedding_error(format!("item {position} has a non-numeric component"))
            })?;
        let index = item["index"]
            .as_u64()
            .map(|i| i as usize)
            .unwrap_or(position);
        indexed.push((index, vec));
    }
    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}

#[async_trait]
impl EmbeddingProvider for OpenAiCompatibleEmbedder {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> RagResult<Vec<f32>> {
        let mut embeddings = self.request(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| embedding_error("empty embedding response"))
    }

    async fn embed_batch(&self, texts: &[String]) -> RagResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }
}

fn embedding_error(err: impl std::fmt::Display) -> RagError {
    RagError::Embedding {
        provider: PROVIDER.to_string(),
        message: err.to_string(),
    }
}
