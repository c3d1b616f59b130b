use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the workspace root exists and is a directory.
    pub workspace_ready: bool,
    /// Configured completion wait strategy (`poll` or `fixed`).
    pub completion: &'static str,
}

/// GET /health -- returns service and workspace health and the wait strategy.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let workspace_ready = tokio::fs::metadata(state.pipeline.workspaces().root())
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);

    let status = if workspace_ready { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        workspace_ready,
        completion: state.config.completion.name(),
    })
}

/// Mount health check routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
