use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::provider::{AnswerGenerator, EmbeddingProvider};
use super::types::{
    BatchEmbedContentsRequest, BatchEmbedContentsResponse, Content, EmbedContentRequest,
    EmbedContentResponse, GenerateContentRequest, GenerateContentResponse,
};
use crate::core::errors::{RagError, RagResult};

const PROVIDER: &str = "gemini";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Normalises `gemini-2.0-flash` and `models/gemini-2.0-flash` to the latter.
pub fn model_resource(model: &str) -> String {
    let model = model.trim();
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

#[derive(Clone)]
struct GeminiHttp {
    base_url: String,
    api_key: String,
    client: Client,
}

impl GeminiHttp {
    fn new(api_key: String, base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        }
    }

    fn method_url(&self, model: &str, method: &str) -> String {
        format!("{}/{}:{}", self.base_url, model_resource(model), method)
    }

    async fn post<B, R>(&self, url: &str, body: &B) -> Result<R, String>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let res = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(format!("{}: {}", status, text));
        }

        res.json::<R>().await.map_err(|e| e.to_string())
    }
}

/// Answer generation through `models/{model}:generateContent`.
#[derive(Clone)]
pub struct GeminiGenerator {
    http: GeminiHttp,
    model: String,
}

impl GeminiGenerator {
    pub fn new(api_key: impl Into<String>, base_url: &str, model: impl Into<String>) -> Self {
        Self {
            http: GeminiHttp::new(api_key.into(), base_url),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl AnswerGenerator for GeminiGenerator {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, prompt: &str) -> RagResult<String> {
        let url = self.http.method_url(&self.model, "generateContent");
        let body = GenerateContentRequest {
            contents: vec![Content::user_text(prompt)],
        };

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "generating answer");
        let response: GenerateContentResponse =
            self.http.post(&url, &body).await.map_err(generation_error)?;

        if let Some(text) = response.text() {
            return Ok(text);
        }

        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|r| format!("prompt blocked: {r}"))
            .or_else(|| {
                response
                    .candidates
                    .first()
                    .and_then(|c| c.finish_reason.clone())
                    .map(|r| format!("no text returned (finish reason {r})"))
            })
            .unwrap_or_else(|| "no candidates returned".to_string());
        Err(generation_error(reason))
    }
}

/// Embeddings through `embedContent` / `batchEmbedContents`.
#[derive(Clone)]
pub struct GeminiEmbedder {
    http: GeminiHttp,
    model: String,
}

impl GeminiEmbedder {
    pub fn new(api_key: impl Into<String>, base_url: &str, model: impl Into<String>) -> Self {
        Self {
            http: GeminiHttp::new(api_key.into(), base_url),
            model: model_resource(&model.into()),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> RagResult<Vec<f32>> {
        let url = self.http.method_url(&self.model, "embedContent");
        let body = EmbedContentRequest {
            model: self.model.clone(),
            content: Content::text(text),
        };

        let response: EmbedContentResponse =
            self.http.post(&url, &body).await.map_err(|e| {
                tracing::error!(provider = PROVIDER, error = %e, "embedding request failed");
                embedding_error(e)
            })?;
        Ok(response.embedding.values)
    }

    async fn embed_batch(&self, texts: &[String]) -> RagResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.http.method_url(&self.model, "batchEmbedContents");
        let body = BatchEmbedContentsRequest {
            requests: texts
                .iter()
                .map(|text| EmbedContentRequest {
                    model: self.model.clone(),
                    content: Content::text(text.as_str()),
                })
                .collect(),
        };

        tracing::debug!(provider = PROVIDER, batch_size = texts.len(), "embedding batch");
        let response: BatchEmbedContentsResponse =
            self.http.post(&url, &body).await.map_err(|e| {
                tracing::error!(provider = PROVIDER, error = %e, "batch embedding request failed");
                embedding_error(e)
            })?;

        if response.embeddings.len() != texts.len() {
            return Err(embedding_error(format!(
                "requested {} embeddings, received {}",
                texts.len(),
                response.embeddings.len()
            )));
        }
        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }
}

fn generation_error(message: impl Into<String>) -> RagError {
    RagError::Generation {
        provider: PROVIDER.to_string(),
        message: message.into(),
    }
}

fn embedding_error(message: impl Into<String>) -> RagError {
    RagError::Embedding {
        provider: PROVIDER.to_string(),
        message: message.into(),
    }
}
