//! Health check handlers

use axum::{extract::State, http::StatusCode, Json};
use pgr_service::dto::{HealthResponse, VersionResponse};
use pgr_service::HealthService;

use crate::state::AppState;

/// Liveness with a database probe
///
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let response = HealthService::new(state.service_context()).check().await;
    let status = if response.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

/// Build information
///
/// GET /version
pub async fn version(State(state): State<AppState>) -> Json<VersionResponse> {
    let app = &state.config().app;
    Json(VersionResponse {
        version: app.version.clone(),
        environment: app.env.as_str().to_string(),
        app_name: app.name.clone(),
    })
}
