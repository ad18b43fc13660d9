use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use super::utils::unix_timestamp;

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": unix_timestamp()
    }))
}
