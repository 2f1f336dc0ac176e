//! SQLite-backed [`CacheStore`]: one row per cache key.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use tracing::debug;

use velocity_core::cache::{CacheStore, StoredBlob};
use velocity_core::errors::StoreError;

use crate::DbPool;

pub struct SqliteCacheStore {
    pool: DbPool,
}

impl SqliteCacheStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM cache_entries")
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.get::<i64, _>("count"))
    }
}

fn backend(error: sqlx::Error) -> StoreError {
    StoreError::Backend(error.to_string())
}

#[async_trait]
impl CacheStore for SqliteCacheStore {
    async fn get(&self, key: &str) -> Result<Option<StoredBlob>, StoreError> {
        let row = sqlx::query("SELECT body, written_at_ms FROM cache_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let written_at_ms = row.try_get::<i64, _>("written_at_ms").map_err(backend)?;
        let written_at = DateTime::<Utc>::from_timestamp_millis(written_at_ms).ok_or_else(|| {
            StoreError::Codec(format!("written_at_ms {written_at_ms} is out of range"))
        })?;

        Ok(Some(StoredBlob { body: row.try_get("body").map_err(backend)?, written_at }))
    }

    async fn put(&self, key: &str, blob: StoredBlob) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO cache_entries (key, body, written_at_ms)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                body = excluded.body,
                written_at_ms = excluded.written_at_ms
            "#,
        )
        .bind(key)
        .bind(&blob.body)
        .bind(blob.written_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        debug!(key, bytes = blob.body.len(), "cache entry written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM cache_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let result =
            sqlx::query("DELETE FROM cache_entries").execute(&self.pool).await.map_err(backend)?;
        debug!(removed = result.rows_affected(), "cache cleared");
        Ok(())
    }
}
