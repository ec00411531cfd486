//! HTTP API handlers
//!
//! JSON-only surface: the check-cycle trigger, current stats, history and
//! time-series queries, milestone cursors/audit log, and a manual
//! re-broadcast endpoint. No page rendering.

pub mod check;
pub mod health;
pub mod milestones;
pub mod notify;
pub mod stats;

pub use check::run_check;
pub use health::health_check;
pub use milestones::{get_milestone_history, get_milestones};
pub use notify::send_notification;
pub use stats::{get_all_stats, get_history, get_time_series};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::Error;

/// HTTP wrapper mapping crate errors to status codes
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
