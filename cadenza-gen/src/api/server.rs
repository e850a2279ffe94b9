//! HTTP server setup and routing
//!
//! Builds the axum router for the generation API and serves it with
//! graceful shutdown.

use crate::config::Config;
use crate::jobs::{JobManager, StatusStore};
use crate::publish::ArtifactPublisher;
use axum::{
    routing::{get, post},
    Router,
};
use cadenza_common::{Error, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shared application context passed to all handlers
///
/// AppContext implements Clone, which gives us `FromRef<AppContext>`
/// for free via axum's blanket implementation.
#[derive(Clone)]
pub struct AppContext {
    pub manager: Arc<JobManager>,
    pub store: Arc<StatusStore>,
    pub publisher: Arc<ArtifactPublisher>,
}

/// Build the API router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))
        // Planning (no audio generated)
        .route("/plan", post(super::handlers::get_plan))
        // Generation job lifecycle
        .route("/generate", post(super::handlers::generate))
        .route("/status/:job_id", get(super::handlers::get_status))
        .route("/download/:job_id", get(super::handlers::download))
        // SSE event stream
        .route("/events", get(super::sse::event_stream))
        // Attach application context
        .with_state(ctx)
        // Enable CORS for local clients
        .layer(CorsLayer::permissive())
}

/// Run the HTTP API server until shutdown is signalled
pub async fn run(config: &Config, ctx: AppContext) -> Result<()> {
    let app = create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Internal(format!("failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Internal(format!("server error: {}", e)))?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}
