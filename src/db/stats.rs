//! Stats store: TTL-bound current-value cache plus retention-pruned history
//!
//! `save_stats` overwrites the current entry and appends to the history log
//! in the same call, pruning entries older than the retention window. A
//! write throttle skips the history append (never the current overwrite)
//! when the previous append for the platform is too recent.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::config::StatsPolicy;
use crate::error::Result;
use crate::platform::Platform;
use crate::time::{from_ms, now_ms};

/// Optional per-platform extra metrics (YouTube only today)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtraStats {
    pub views: Option<u64>,
    pub videos: Option<u64>,
}

/// Most recent observation for a platform, valid until its TTL expires
#[derive(Debug, Clone, Serialize)]
pub struct CurrentStats {
    pub platform: Platform,
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub videos: Option<u64>,
    /// Epoch milliseconds of the fetch that produced this value
    pub fetched_at: i64,
}

/// One persisted observation in the history log
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub platform: Platform,
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub videos: Option<u64>,
    /// Epoch milliseconds
    pub timestamp: i64,
}

/// One averaged bucket of the time series
#[derive(Debug, Clone, Serialize)]
pub struct TimePoint {
    /// Bucket start, epoch milliseconds
    pub timestamp: i64,
    /// Arithmetic mean of counts in the bucket, rounded
    pub count: u64,
    /// Bucket start formatted as HH:MM (UTC)
    pub time: String,
}

/// Time-series query window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    Day,
    Week,
    Month,
}

impl TimeRange {
    pub fn duration_ms(&self) -> i64 {
        match self {
            TimeRange::Day => 24 * 60 * 60 * 1_000,
            TimeRange::Week => 7 * 24 * 60 * 60 * 1_000,
            TimeRange::Month => 30 * 24 * 60 * 60 * 1_000,
        }
    }

    pub fn parse(s: &str) -> Option<TimeRange> {
        match s {
            "day" => Some(TimeRange::Day),
            "week" => Some(TimeRange::Week),
            "month" => Some(TimeRange::Month),
            _ => None,
        }
    }
}

const BUCKET_MS: i64 = 60 * 60 * 1_000; // 1 hour

/// Save a fetched count: overwrite the TTL-bound current entry, append to the
/// history log unless throttled, prune history past the retention window
pub async fn save_stats(
    db: &SqlitePool,
    platform: Platform,
    count: u64,
    extra: ExtraStats,
    policy: &StatsPolicy,
) -> Result<()> {
    let now = now_ms();

    sqlx::query(
        r#"
        INSERT INTO stats_current (platform, count, views, videos, fetched_at, expires_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(platform) DO UPDATE SET
            count = excluded.count,
            views = excluded.views,
            videos = excluded.videos,
            fetched_at = excluded.fetched_at,
            expires_at = excluded.expires_at
        "#,
    )
    .bind(platform.key())
    .bind(count as i64)
    .bind(extra.views.map(|v| v as i64))
    .bind(extra.videos.map(|v| v as i64))
    .bind(now)
    .bind(now + policy.cache_ttl_ms)
    .execute(db)
    .await?;

    // Throttle: skip the history append when the last one is too recent.
    // The current-entry overwrite above always happens.
    let last_append: Option<i64> =
        sqlx::query_scalar("SELECT MAX(timestamp) FROM stats_history WHERE platform = ?")
            .bind(platform.key())
            .fetch_one(db)
            .await?;

    if let Some(last) = last_append {
        if now - last < policy.history_min_interval_ms {
            debug!(
                platform = platform.key(),
                "Skipping history append (last {} ms ago)",
                now - last
            );
            return Ok(());
        }
    }

    sqlx::query(
        "INSERT INTO stats_history (platform, count, views, videos, timestamp)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(platform.key())
    .bind(count as i64)
    .bind(extra.views.map(|v| v as i64))
    .bind(extra.videos.map(|v| v as i64))
    .bind(now)
    .execute(db)
    .await?;

    // Prune in the same write; no separate cleanup job
    sqlx::query("DELETE FROM stats_history WHERE platform = ? AND timestamp < ?")
        .bind(platform.key())
        .bind(now - policy.history_retention_ms)
        .execute(db)
        .await?;

    debug!(platform = platform.key(), count, "Saved stats");
    Ok(())
}

/// Get the cached current stats for a platform; absent once the TTL expired
pub async fn get_current(db: &SqlitePool, platform: Platform) -> Result<Option<CurrentStats>> {
    let row = sqlx::query_as::<_, (i64, Option<i64>, Option<i64>, i64)>(
        "SELECT count, views, videos, fetched_at FROM stats_current
         WHERE platform = ? AND expires_at > ?",
    )
    .bind(platform.key())
    .bind(now_ms())
    .fetch_optional(db)
    .await?;

    Ok(row.map(|(count, views, videos, fetched_at)| CurrentStats {
        platform,
        count: count.max(0) as u64,
        views: views.map(|v| v.max(0) as u64),
        videos: videos.map(|v| v.max(0) as u64),
        fetched_at,
    }))
}

/// Get current stats for every platform with an unexpired cache entry
pub async fn get_all_current(db: &SqlitePool) -> Result<Vec<CurrentStats>> {
    let mut all = Vec::new();
    for platform in Platform::ALL {
        if let Some(stats) = get_current(db, platform).await? {
            all.push(stats);
        }
    }
    Ok(all)
}

/// Get history snapshots within `[start, end]`, ascending by timestamp
pub async fn get_history(
    db: &SqlitePool,
    platform: Platform,
    start: i64,
    end: i64,
) -> Result<Vec<Snapshot>> {
    let rows = sqlx::query_as::<_, (i64, Option<i64>, Option<i64>, i64)>(
        "SELECT count, views, videos, timestamp FROM stats_history
         WHERE platform = ? AND timestamp >= ? AND timestamp <= ?
         ORDER BY timestamp ASC",
    )
    .bind(platform.key())
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(count, views, videos, timestamp)| Snapshot {
            platform,
            count: count.max(0) as u64,
            views: views.map(|v| v.max(0) as u64),
            videos: videos.map(|v| v.max(0) as u64),
            timestamp,
        })
        .collect())
}

/// Build the chart time series for a range: history bucketed into fixed
/// 1-hour buckets, arithmetic mean per bucket, ascending. Recomputed on every
/// call, never cached.
pub async fn get_time_series(
    db: &SqlitePool,
    platform: Platform,
    range: TimeRange,
) -> Result<Vec<TimePoint>> {
    let now = now_ms();
    let history = get_history(db, platform, now - range.duration_ms(), now).await?;

    let mut buckets: std::collections::BTreeMap<i64, Vec<u64>> = std::collections::BTreeMap::new();
    for snapshot in &history {
        let bucket = snapshot.timestamp.div_euclid(BUCKET_MS);
        buckets.entry(bucket).or_default().push(snapshot.count);
    }

    Ok(buckets
        .into_iter()
        .map(|(bucket, counts)| {
            let sum: u64 = counts.iter().sum();
            let avg = (sum as f64 / counts.len() as f64).round() as u64;
            let timestamp = bucket * BUCKET_MS;
            TimePoint {
                timestamp,
                count: avg,
                time: from_ms(timestamp).format("%H:%M").to_string(),
            }
        })
        .collect())
}
