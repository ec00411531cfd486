//! Check-cycle trigger endpoint
//!
//! The orchestrator holds no internal timer; a scheduled job, a manual admin
//! action, or a passive page visit hits this endpoint. Repeated quick
//! invocations are safe: the cache TTL, the history throttle, and the
//! cursor gate provide the idempotence.

use axum::extract::State;
use axum::Json;

use crate::checker::{self, CheckReport};
use crate::AppState;

/// POST /api/check
pub async fn run_check(State(state): State<AppState>) -> Json<CheckReport> {
    Json(checker::run_check(&state).await)
}
