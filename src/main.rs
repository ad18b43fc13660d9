use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use rag_chatbot_backend::core::config::AppPaths;
use rag_chatbot_backend::core::logging;
use rag_chatbot_backend::server::router::router;
use rag_chatbot_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let paths = Arc::new(AppPaths::new());
    logging::init(&paths, "server.log");

    let state = AppState::initialize(paths).context("Failed to initialize application state")?;

    let bind_addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);
    tracing::info!(
        "Serving index {} (logs in {})",
        state.index_dir().display(),
        state.log_dir().display()
    );
    tracing::info!(
        "CORS origin allowed: {}",
        state.config.server.cors_allowed_origin
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
}
