use chrono::{DateTime, Utc};
use sqlx::Row;

use gearfit_core::cache::CacheStore;
use gearfit_core::domain::cache::{CacheEntry, CacheKey};
use gearfit_core::errors::ApplicationError;

use super::{decode_error, format_timestamp, parse_timestamp, RepositoryError};
use crate::DbPool;

pub struct SqlCacheRepository {
    pool: DbPool,
}

impl SqlCacheRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, RepositoryError> {
        let row = sqlx::query(
            "SELECT key, operation, namespace, payload, expires_at, created_at, updated_at
             FROM api_cache WHERE key = ?",
        )
        .bind(&key.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_entry(r)?)),
            None => Ok(None),
        }
    }

    /// Last writer by `updated_at` wins; stale writes are ignored.
    pub async fn upsert(&self, entry: &CacheEntry) -> Result<(), RepositoryError> {
        let payload = serde_json::to_string(&entry.payload)
            .map_err(|error| RepositoryError::Decode(format!("payload: {error}")))?;

        sqlx::query(
            "INSERT INTO api_cache (key, operation, namespace, payload, expires_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
                 operation = excluded.operation,
                 namespace = excluded.namespace,
                 payload = excluded.payload,
                 expires_at = excluded.expires_at,
                 updated_at = excluded.updated_at
             WHERE excluded.updated_at >= api_cache.updated_at",
        )
        .bind(&entry.key.0)
        .bind(&entry.operation)
        .bind(&entry.namespace)
        .bind(payload)
        .bind(format_timestamp(entry.expires_at))
        .bind(format_timestamp(entry.created_at))
        .bind(format_timestamp(entry.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn delete(&self, key: &CacheKey) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM api_cache WHERE key = ?").bind(&key.0).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_namespace(&self, namespace: &str) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM api_cache WHERE namespace = ?")
            .bind(namespace)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM api_cache WHERE expires_at <= ?")
            .bind(format_timestamp(now))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<CacheEntry, RepositoryError> {
    let payload: String = row.try_get("payload").map_err(decode_error)?;
    let expires_at: String = row.try_get("expires_at").map_err(decode_error)?;
    let created_at: String = row.try_get("created_at").map_err(decode_error)?;
    let updated_at: String = row.try_get("updated_at").map_err(decode_error)?;

    Ok(CacheEntry {
        key: CacheKey(row.try_get("key").map_err(decode_error)?),
        operation: row.try_get("operation").map_err(decode_error)?,
        namespace: row.try_get("namespace").map_err(decode_error)?,
        payload: serde_json::from_str(&payload)
            .map_err(|error| RepositoryError::Decode(format!("payload: {error}")))?,
        expires_at: parse_timestamp("expires_at", &expires_at)?,
        created_at: parse_timestamp("created_at", &created_at)?,
        updated_at: parse_timestamp("updated_at", &updated_at)?,
    })
}

#[async_trait::async_trait]
impl CacheStore for SqlCacheRepository {
    async fn get_entry(&self, key: &CacheKey) -> Result<Option<CacheEntry>, ApplicationError> {
        Ok(self.get(key).await?)
    }

    async fn upsert_entry(&self, entry: CacheEntry) -> Result<(), ApplicationError> {
        Ok(self.upsert(&entry).await?)
    }

    async fn delete_entry(&self, key: &CacheKey) -> Result<bool, ApplicationError> {
        Ok(self.delete(key).await?)
    }

    async fn clear_namespace(&self, namespace: &str) -> Result<u64, ApplicationError> {
        Ok(self.delete_namespace(namespace).await?)
    }

    async fn clear_expired(&self, now: DateTime<Utc>) -> Result<u64, ApplicationError> {
        Ok(self.delete_expired(now).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration as StdDuration;

    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    use gearfit_core::cache::{CacheOptions, CacheStore, ResultCache};
    use gearfit_core::clock::ManualClock;
    use gearfit_core::domain::cache::{CacheCategory, CacheEntry, CacheKey};

    use super::SqlCacheRepository;
    use crate::repositories::test_support::setup;

    fn entry(key: &str, namespace: &str, expires_in_minutes: i64) -> CacheEntry {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).single().expect("timestamp");
        CacheEntry {
            key: CacheKey(key.to_string()),
            operation: "case_candidates".to_string(),
            namespace: namespace.to_string(),
            payload: json!({"cases": ["case-a", "case-b"], "count": 2}),
            expires_at: now + Duration::minutes(expires_in_minutes),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn upsert_keeps_one_row_per_key_and_original_created_at() {
        let repo = SqlCacheRepository::new(setup().await);
        let first = entry("k1", "search", 10);
        repo.upsert_entry(first.clone()).await.expect("insert");

        let mut replacement = entry("k1", "search", 60);
        replacement.payload = json!({"cases": []});
        replacement.created_at = first.created_at + Duration::minutes(5);
        replacement.updated_at = replacement.created_at;
        repo.upsert_entry(replacement.clone()).await.expect("replace");

        let stored = repo.get_entry(&CacheKey("k1".to_string())).await.expect("get").expect("present");
        assert_eq!(stored.payload, json!({"cases": []}));
        assert_eq!(stored.expires_at, replacement.expires_at);
        assert_eq!(stored.created_at, first.created_at);
        assert_eq!(stored.updated_at, replacement.updated_at);
    }

    #[tokio::test]
    async fn stale_write_is_ignored() {
        let repo = SqlCacheRepository::new(setup().await);
        let mut newer = entry("k1", "search", 60);
        newer.updated_at = newer.created_at + Duration::minutes(10);
        repo.upsert_entry(newer.clone()).await.expect("newer write");

        let mut older = entry("k1", "search", 5);
        older.payload = json!({"cases": []});
        repo.upsert_entry(older).await.expect("late older write");

        let stored = repo.get_entry(&CacheKey("k1".to_string())).await.expect("get").expect("present");
        assert_eq!(stored.payload, newer.payload);
        assert_eq!(stored.expires_at, newer.expires_at);
        assert_eq!(stored.updated_at, newer.updated_at);
    }

    #[tokio::test]
    async fn clear_expired_and_namespace_report_removed_rows() {
        let repo = SqlCacheRepository::new(setup().await);
        for (key, namespace, minutes) in
            [("k1", "search", -5), ("k2", "search", 30), ("k3", "pricing", 0), ("k4", "pricing", 90)]
        {
            repo.upsert_entry(entry(key, namespace, minutes)).await.expect("insert");
        }
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).single().expect("timestamp");

        assert_eq!(repo.clear_expired(now).await.expect("expired"), 2);
        assert_eq!(repo.clear_namespace("search").await.expect("namespace"), 1);
        assert!(repo.get_entry(&CacheKey("k4".to_string())).await.expect("get").is_some());
        assert!(repo.delete_entry(&CacheKey("k4".to_string())).await.expect("delete"));
        assert!(!repo.delete_entry(&CacheKey("k4".to_string())).await.expect("delete again"));
    }

    #[tokio::test]
    async fn result_cache_round_trips_through_sqlite() {
        let start = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).single().expect("timestamp");
        let clock = Arc::new(ManualClock::new(start));
        let cache = ResultCache::new(Arc::new(SqlCacheRepository::new(setup().await)))
            .with_clock(clock.clone());
        let params = json!({"brand": "gator", "max_price": "150"});
        let options = CacheOptions::new(CacheCategory::Search).with_ttl(StdDuration::from_secs(60));

        cache.set("case_candidates", &params, json!(["case-a"]), &options).await.expect("set");
        let hit = cache.get("case_candidates", &params).await.expect("get");
        assert_eq!(hit, Some(json!(["case-a"])));

        clock.advance(Duration::seconds(61));
        let miss = cache.get("case_candidates", &params).await.expect("get");
        assert_eq!(miss, None);
    }
}
