use std::any::Any;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::core::config::ServerConfig;
use crate::core::errors::ApiError;
use crate::server::handlers::{chat, health};
use crate::state::AppState;

const FALLBACK_ORIGIN: &str = "http://localhost:5173";

/// Creates the application router.
///
/// Routes are served at the root and again under `/api`, which is where the
/// web frontend expects them.
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state.config.server);

    let api = Router::new()
        .route("/health", get(health::health))
        .route("/chat", post(chat::chat));

    Router::new()
        .merge(api.clone())
        .nest("/api", api)
        .fallback(not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(server: &ServerConfig) -> CorsLayer {
    let origin = HeaderValue::from_str(server.cors_allowed_origin.trim()).unwrap_or_else(|_| {
        tracing::warn!(
            "Invalid CORS origin '{}'; falling back to {}",
            server.cors_allowed_origin,
            FALLBACK_ORIGIN
        );
        HeaderValue::from_static(FALLBACK_ORIGIN)
    });

    // Mirroring instead of `Any`: wildcards are not allowed together with credentials.
    CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Not Found".to_string())
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    ApiError::internal(detail).into_response()
}
