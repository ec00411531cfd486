//! Milestone cursor and audit log endpoints

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use super::ApiError;
use crate::db::milestones::{self, MilestoneRecord};
use crate::milestones::format_milestone;
use crate::platform::Platform;
use crate::AppState;

/// One platform's cursor value
#[derive(Debug, Serialize)]
pub struct CursorEntry {
    pub platform: Platform,
    pub value: u64,
    pub formatted: String,
}

/// GET /api/milestones
///
/// Last notified milestone per platform.
pub async fn get_milestones(
    State(state): State<AppState>,
) -> Result<Json<Vec<CursorEntry>>, ApiError> {
    let cursors = milestones::get_all_last(&state.db).await?;
    Ok(Json(
        cursors
            .into_iter()
            .map(|(platform, value)| CursorEntry {
                platform,
                value,
                formatted: format_milestone(value),
            })
            .collect(),
    ))
}

/// GET /api/milestones/:platform/history
///
/// Audit log of cursor advances (seeds and notifications), ascending.
pub async fn get_milestone_history(
    State(state): State<AppState>,
    Path(platform): Path<String>,
) -> Result<Json<Vec<MilestoneRecord>>, ApiError> {
    let platform: Platform = platform.parse()?;
    let history = milestones::get_milestone_history(&state.db, platform).await?;
    Ok(Json(history))
}
