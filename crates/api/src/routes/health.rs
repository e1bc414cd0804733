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
    /// Whether the BaaS is reachable.
    pub baas_healthy: bool,
}

/// GET /health -- returns service and BaaS health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let baas_healthy = radio_db::health_check(state.store.as_ref()).await.is_ok();

    let status = if baas_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        baas_healthy,
    })
}

/// Mount health check routes (intended for root level, NOT under `/api`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
