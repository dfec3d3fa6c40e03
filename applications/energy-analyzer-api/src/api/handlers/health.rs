use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};
use tracing::warn;

use super::AppState;

/// GET /
pub async fn banner() -> &'static str {
    "Energy Analyzer Backend running"
}

/// GET /health
/// 503 when the backing store does not answer.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let backend = state.stores.backend_name();
    match state.stores.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": backend })),
        ),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "database": backend })),
            )
        }
    }
}

/// GET /api/uptime
pub async fn uptime(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "backendStartTime": state.started_at.to_rfc3339() }))
}
