//! Database initialization
//!
//! Creates the SQLite database and schema on first run. The pool is
//! constructed once at startup and passed explicitly into every store call;
//! there is no lazily-initialized global client.

use crate::error::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL mode allows concurrent readers with one writer; check cycles,
    // manual triggers and page-visit triggers can overlap
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // Current-stats cache: one row per platform, TTL via expires_at
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS stats_current (
            platform TEXT PRIMARY KEY,
            count INTEGER NOT NULL,
            views INTEGER,
            videos INTEGER,
            fetched_at INTEGER NOT NULL,
            expires_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Append-only time series, pruned by retention window on write
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS stats_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            platform TEXT NOT NULL,
            count INTEGER NOT NULL,
            views INTEGER,
            videos INTEGER,
            timestamp INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_stats_history_platform_ts
         ON stats_history (platform, timestamp)",
    )
    .execute(pool)
    .await?;

    // Highest milestone already notified, per platform
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS milestone_cursor (
            platform TEXT PRIMARY KEY,
            value INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            expires_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Audit log of cursor advances
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS milestone_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            platform TEXT NOT NULL,
            value INTEGER NOT NULL,
            timestamp INTEGER NOT NULL,
            notified INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_milestone_history_platform_ts
         ON milestone_history (platform, timestamp)",
    )
    .execute(pool)
    .await?;

    // Broadcast recipients; mutated exclusively by the external bot webhook
    // command handler, read-only in this service
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS subscribers (
            chat_id INTEGER PRIMARY KEY
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
