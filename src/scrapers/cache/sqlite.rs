//! SQLite-backed page cache, shared across runs.
//!
//! Timestamps are stored as unix milliseconds. Database errors are logged
//! and treated as cache misses so a broken cache never fails a fetch.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;

use super::{CachedResponse, PageCache};
use crate::repository::diesel_models::PageCacheRecord;
use crate::repository::util::from_unix_millis;
use crate::repository::DbPool;
use crate::schema::page_cache;

impl From<PageCacheRecord> for CachedResponse {
    fn from(record: PageCacheRecord) -> Self {
        CachedResponse {
            key: record.key,
            body: record.body,
            fetched_at: from_unix_millis(record.fetched_at),
            expires_at: from_unix_millis(record.expires_at),
        }
    }
}

#[derive(Clone)]
pub struct SqlitePageCache {
    pool: DbPool,
}

impl SqlitePageCache {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn lookup(&self, key: &str) -> Result<Option<PageCacheRecord>, diesel::result::Error> {
        let mut conn = self.pool.get().await?;
        let now = Utc::now().timestamp_millis();

        page_cache::table
            .filter(page_cache::key.eq(key))
            .filter(page_cache::expires_at.gt(now))
            .select(PageCacheRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
    }

    async fn store(&self, response: &CachedResponse) -> Result<(), diesel::result::Error> {
        let mut conn = self.pool.get().await?;

        diesel::replace_into(page_cache::table)
            .values((
                page_cache::key.eq(&response.key),
                page_cache::body.eq(&response.body),
                page_cache::fetched_at.eq(response.fetched_at.timestamp_millis()),
                page_cache::expires_at.eq(response.expires_at.timestamp_millis()),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete_expired(&self) -> Result<usize, diesel::result::Error> {
        let mut conn = self.pool.get().await?;
        let now = Utc::now().timestamp_millis();

        diesel::delete(page_cache::table.filter(page_cache::expires_at.le(now)))
            .execute(&mut conn)
            .await
    }
}

#[async_trait]
impl PageCache for SqlitePageCache {
    async fn get(&self, key: &str) -> Option<CachedResponse> {
        match self.lookup(key).await {
            Ok(record) => record.map(CachedResponse::from),
            Err(e) => {
                warn!("Page cache read failed for {}: {}", key, e);
                None
            }
        }
    }

    async fn put(&self, key: &str, body: &str, ttl: Duration) {
        let response = CachedResponse::new(key, body, ttl);
        if let Err(e) = self.store(&response).await {
            warn!("Page cache write failed for {}: {}", key, e);
        }
    }

    async fn purge_expired(&self) -> usize {
        match self.delete_expired().await {
            Ok(n) => n,
            Err(e) => {
                warn!("Page cache purge failed: {}", e);
                0
            }
        }
    }
}
