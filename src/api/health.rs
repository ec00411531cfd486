//! Health check endpoint

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::ApiError;
use crate::db::subscribers;
use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    /// Registered broadcast recipients
    pub subscribers: i64,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let subscribers = subscribers::count(&state.db).await?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        module: "fanpulse".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        subscribers,
    }))
}
