//! Milestone cursor store
//!
//! Tracks the highest milestone already notified per platform (the cursor)
//! plus an audit log of every advance. The cursor is monotonically
//! non-decreasing; callers must only advance it after at least one broadcast
//! delivery succeeded, so a fully failed broadcast retries the same
//! threshold on the next invocation.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::config::MilestonePolicy;
use crate::error::Result;
use crate::platform::Platform;
use crate::time::now_ms;

/// Audit record written whenever the cursor moves
#[derive(Debug, Clone, Serialize)]
pub struct MilestoneRecord {
    pub platform: Platform,
    pub value: u64,
    /// Epoch milliseconds
    pub timestamp: i64,
    /// False for bootstrap seeding, true for a notified milestone
    pub notified: bool,
}

/// Get the last notified milestone for a platform; absent when never set or
/// past its TTL
pub async fn get_last(db: &SqlitePool, platform: Platform) -> Result<Option<u64>> {
    let value: Option<i64> = sqlx::query_scalar(
        "SELECT value FROM milestone_cursor WHERE platform = ? AND expires_at > ?",
    )
    .bind(platform.key())
    .bind(now_ms())
    .fetch_optional(db)
    .await?;

    Ok(value.map(|v| v.max(0) as u64))
}

/// Get every platform's cursor value
pub async fn get_all_last(db: &SqlitePool) -> Result<Vec<(Platform, u64)>> {
    let mut all = Vec::new();
    for platform in Platform::ALL {
        if let Some(value) = get_last(db, platform).await? {
            all.push((platform, value));
        }
    }
    Ok(all)
}

/// Advance the cursor after a successful notification
///
/// Refreshes the TTL and appends a `notified = true` audit record. The
/// cursor never moves backwards: a stale writer racing a newer one leaves
/// the higher value in place.
pub async fn set_last(
    db: &SqlitePool,
    platform: Platform,
    value: u64,
    policy: &MilestonePolicy,
) -> Result<()> {
    write_cursor(db, platform, value, true, policy).await
}

/// Seed the cursor on first observation of a platform, without notifying
///
/// Appends a `notified = false` audit record so the bootstrap is visible in
/// the history.
pub async fn seed(
    db: &SqlitePool,
    platform: Platform,
    value: u64,
    policy: &MilestonePolicy,
) -> Result<()> {
    write_cursor(db, platform, value, false, policy).await
}

async fn write_cursor(
    db: &SqlitePool,
    platform: Platform,
    value: u64,
    notified: bool,
    policy: &MilestonePolicy,
) -> Result<()> {
    let now = now_ms();

    // The monotonic guard only binds while the stored row is live; an
    // expired row no longer represents a notified state and must not block
    // a re-seed, or the platform could never notify again.
    let result = sqlx::query(
        r#"
        INSERT INTO milestone_cursor (platform, value, updated_at, expires_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(platform) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at,
            expires_at = excluded.expires_at
        WHERE excluded.value > milestone_cursor.value
           OR milestone_cursor.expires_at <= excluded.updated_at
        "#,
    )
    .bind(platform.key())
    .bind(value as i64)
    .bind(now)
    .bind(now + policy.cursor_ttl_ms)
    .execute(db)
    .await?;

    // Rejected write: the cursor did not move, so nothing belongs in the
    // audit log
    if result.rows_affected() == 0 {
        debug!(platform = platform.key(), value, "Cursor write rejected, no advance");
        return Ok(());
    }

    sqlx::query(
        "INSERT INTO milestone_history (platform, value, timestamp, notified)
         VALUES (?, ?, ?, ?)",
    )
    .bind(platform.key())
    .bind(value as i64)
    .bind(now)
    .bind(notified)
    .execute(db)
    .await?;

    sqlx::query("DELETE FROM milestone_history WHERE platform = ? AND timestamp < ?")
        .bind(platform.key())
        .bind(now - policy.history_retention_ms)
        .execute(db)
        .await?;

    debug!(platform = platform.key(), value, notified, "Cursor written");
    Ok(())
}

/// Audit log for a platform, ascending by timestamp
pub async fn get_milestone_history(
    db: &SqlitePool,
    platform: Platform,
) -> Result<Vec<MilestoneRecord>> {
    let rows = sqlx::query_as::<_, (i64, i64, bool)>(
        "SELECT value, timestamp, notified FROM milestone_history
         WHERE platform = ? ORDER BY timestamp ASC, id ASC",
    )
    .bind(platform.key())
    .fetch_all(db)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(value, timestamp, notified)| MilestoneRecord {
            platform,
            value: value.max(0) as u64,
            timestamp,
            notified,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::create_schema;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_schema(&pool).await.unwrap();
        pool
    }

    fn policy() -> MilestonePolicy {
        MilestonePolicy {
            cursor_ttl_ms: 365 * 86_400_000,
            history_retention_ms: 30 * 86_400_000,
        }
    }

    #[tokio::test]
    async fn test_get_last_absent_initially() {
        let pool = test_pool().await;
        assert_eq!(get_last(&pool, Platform::YouTube).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_and_get_last() {
        let pool = test_pool().await;
        set_last(&pool, Platform::YouTube, 10_000, &policy()).await.unwrap();
        assert_eq!(get_last(&pool, Platform::YouTube).await.unwrap(), Some(10_000));

        // Other platforms unaffected
        assert_eq!(get_last(&pool, Platform::Telegram).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cursor_never_decreases() {
        let pool = test_pool().await;
        set_last(&pool, Platform::Telegram, 5_000, &policy()).await.unwrap();
        set_last(&pool, Platform::Telegram, 2_000, &policy()).await.unwrap();
        assert_eq!(get_last(&pool, Platform::Telegram).await.unwrap(), Some(5_000));

        // The rejected write left no trace in the audit log
        let history = get_milestone_history(&pool, Platform::Telegram).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].value, 5_000);
    }

    #[tokio::test]
    async fn test_expired_cursor_can_be_reseeded() {
        let pool = test_pool().await;
        let now = now_ms();

        // Cursor row whose TTL lapsed 35 days ago
        sqlx::query(
            "INSERT INTO milestone_cursor (platform, value, updated_at, expires_at)
             VALUES ('youtube', 10000, ?, ?)",
        )
        .bind(now - 400 * 86_400_000)
        .bind(now - 35 * 86_400_000)
        .execute(&pool)
        .await
        .unwrap();
        assert_eq!(get_last(&pool, Platform::YouTube).await.unwrap(), None);

        // Re-seeding with the same value must take effect despite the
        // stored row holding an equal value
        seed(&pool, Platform::YouTube, 10_000, &policy()).await.unwrap();

        assert_eq!(get_last(&pool, Platform::YouTube).await.unwrap(), Some(10_000));
        let history = get_milestone_history(&pool, Platform::YouTube).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(!history[0].notified);
    }

    #[tokio::test]
    async fn test_seed_records_unnotified_entry() {
        let pool = test_pool().await;
        seed(&pool, Platform::Instagram, 20_000, &policy()).await.unwrap();

        assert_eq!(get_last(&pool, Platform::Instagram).await.unwrap(), Some(20_000));
        let history = get_milestone_history(&pool, Platform::Instagram).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(!history[0].notified);
        assert_eq!(history[0].value, 20_000);
    }

    #[tokio::test]
    async fn test_advance_appends_notified_record() {
        let pool = test_pool().await;
        seed(&pool, Platform::YouTube, 9_000, &policy()).await.unwrap();
        set_last(&pool, Platform::YouTube, 10_000, &policy()).await.unwrap();

        let history = get_milestone_history(&pool, Platform::YouTube).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(!history[0].notified);
        assert!(history[1].notified);
        assert_eq!(history[1].value, 10_000);
    }

    #[tokio::test]
    async fn test_audit_log_pruned_by_retention() {
        let pool = test_pool().await;
        let now = now_ms();
        sqlx::query(
            "INSERT INTO milestone_history (platform, value, timestamp, notified)
             VALUES ('youtube', 1000, ?, 1)",
        )
        .bind(now - 31 * 86_400_000)
        .execute(&pool)
        .await
        .unwrap();

        set_last(&pool, Platform::YouTube, 2_000, &policy()).await.unwrap();

        let history = get_milestone_history(&pool, Platform::YouTube).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].value, 2_000);
    }

    #[tokio::test]
    async fn test_get_all_last() {
        let pool = test_pool().await;
        set_last(&pool, Platform::YouTube, 10_000, &policy()).await.unwrap();
        set_last(&pool, Platform::Telegram, 1_000, &policy()).await.unwrap();

        let all = get_all_last(&pool).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.contains(&(Platform::YouTube, 10_000)));
        assert!(all.contains(&(Platform::Telegram, 1_000)));
    }
}
