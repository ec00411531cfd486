//! Subscriber registry, read-only
//!
//! The `subscribers` table is owned by the external bot webhook command
//! handler (`/start`, `/stop`); this service only reads the recipient set
//! when fanning out a broadcast.

use sqlx::SqlitePool;

use crate::error::Result;

/// List all registered recipient chat ids
pub async fn list(db: &SqlitePool) -> Result<Vec<i64>> {
    let ids: Vec<i64> = sqlx::query_scalar("SELECT chat_id FROM subscribers ORDER BY chat_id")
        .fetch_all(db)
        .await?;
    Ok(ids)
}

/// Number of registered recipients
pub async fn count(db: &SqlitePool) -> Result<i64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscribers")
        .fetch_one(db)
        .await?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::create_schema;
    use sqlx::sqlite::SqlitePoolOptions;

    #[tokio::test]
    async fn test_list_and_count() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_schema(&pool).await.unwrap();

        assert!(list(&pool).await.unwrap().is_empty());

        for id in [3, 1, 2] {
            sqlx::query("INSERT INTO subscribers (chat_id) VALUES (?)")
                .bind(id)
                .execute(&pool)
                .await
                .unwrap();
        }

        assert_eq!(list(&pool).await.unwrap(), vec![1, 2, 3]);
        assert_eq!(count(&pool).await.unwrap(), 3);
    }
}
