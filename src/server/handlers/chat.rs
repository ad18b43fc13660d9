use std::sync::Arc;

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use super::utils::{preview, unix_timestamp, AppJson};
use crate::state::AppState;

pub const DEFAULT_SESSION_ID: &str = "default";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub answer: String,
    pub context: Option<String>,
    pub session_id: String,
    pub timestamp: f64,
    /// Present only when a collaborator failure was recovered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<ChatRequest>,
) -> AppJson<ChatReply> {
    let span = tracing::info_span!("chat", request_id = %Uuid::new_v4());
    async move {
        tracing::info!(
            "Received chat request with message: {}...",
            preview(&request.message, 50)
        );

        let response = state.chat.respond(&request.message).await;
        if let Some(error) = &response.error {
            tracing::warn!("Chat request degraded: {}", error);
        }

        let session_id = request
            .session_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string());

        tracing::info!("Chatbot response: {:?}", response);

        AppJson(ChatReply {
            answer: response.answer,
            context: response.context,
            session_id,
            timestamp: unix_timestamp(),
            error: response.error,
        })
    }
    .instrument(span)
    .await
}
