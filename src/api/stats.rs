//! Stats query endpoints

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use crate::db::stats::{self, CurrentStats, Snapshot, TimePoint, TimeRange};
use crate::error::Error;
use crate::platform::Platform;
use crate::time::now_ms;
use crate::AppState;

/// GET /api/stats
///
/// Current cached stats for every platform with an unexpired entry.
pub async fn get_all_stats(
    State(state): State<AppState>,
) -> Result<Json<Vec<CurrentStats>>, ApiError> {
    let all = stats::get_all_current(&state.db).await?;
    Ok(Json(all))
}

/// Query window for history requests, epoch milliseconds
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

/// GET /api/stats/:platform/history?start=&end=
///
/// Snapshots within the window (default: last 24 hours), ascending.
pub async fn get_history(
    State(state): State<AppState>,
    Path(platform): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<Snapshot>>, ApiError> {
    let platform: Platform = platform.parse()?;
    let now = now_ms();
    let start = query.start.unwrap_or(now - 24 * 60 * 60 * 1_000);
    let end = query.end.unwrap_or(now);

    let history = stats::get_history(&state.db, platform, start, end).await?;
    Ok(Json(history))
}

#[derive(Debug, Deserialize)]
pub struct TimeSeriesQuery {
    #[serde(default = "default_range")]
    pub range: String,
}

fn default_range() -> String {
    "day".to_string()
}

/// GET /api/stats/:platform/timeseries?range=day|week|month
pub async fn get_time_series(
    State(state): State<AppState>,
    Path(platform): Path<String>,
    Query(query): Query<TimeSeriesQuery>,
) -> Result<Json<Vec<TimePoint>>, ApiError> {
    let platform: Platform = platform.parse()?;
    let range = TimeRange::parse(&query.range)
        .ok_or_else(|| Error::InvalidInput(format!("unknown range: {}", query.range)))?;

    let series = stats::get_time_series(&state.db, platform, range).await?;
    Ok(Json(series))
}
