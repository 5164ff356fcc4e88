//! HTTP API gateway for DocChat.
//!
//! Exposes a health check and the v1 session API. Every session lives in
//! memory; a request locks its session for its whole duration, so the
//! actions on one session run strictly one after another.
//!
//! Built on Axum.

pub mod api;

use axum::extract::DefaultBodyLimit;
use axum::{Router, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use docchat_agent::Orchestrator;
use docchat_config::AppConfig;

pub use api::{ApiState, SharedApiState};

/// Headroom above the document limit so oversized uploads reach the
/// extractor and get its error message.
const BODY_LIMIT_SLACK: usize = 1024 * 1024;

/// Build the full router: health check plus the v1 API.
pub fn build_router(state: SharedApiState) -> Router {
    let body_limit = usize::try_from(state.config.document.max_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(BODY_LIMIT_SLACK);

    Router::new()
        .route("/health", get(health_handler))
        .nest("/v1", api::v1_router(state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let provider = docchat_providers::build_from_config(&config)?;
    let mut orchestrator = Orchestrator::new(provider).with_temperature(config.temperature);
    if let Some(knowledge) = docchat_tools::build_from_config(&config.fallback)? {
        orchestrator = orchestrator.with_knowledge(knowledge);
    }

    let state = Arc::new(ApiState::new(config, orchestrator));
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting with v1 API");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
