//! Time-bounded cache of fetched listing pages.
//!
//! A hit is returned only while `now < expires_at`. Expired entries read as
//! misses and are overwritten by the next `put` for the same key. There is
//! no size bound beyond TTL expiry; call `purge_expired` on long runs.

mod memory;
mod sqlite;

pub use memory::MemoryPageCache;
pub use sqlite::SqlitePageCache;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A previously fetched response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// Request URL.
    pub key: String,
    pub body: String,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CachedResponse {
    pub fn new(key: &str, body: &str, ttl: Duration) -> Self {
        let fetched_at = Utc::now();
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        Self {
            key: key.to_string(),
            body: body.to_string(),
            fetched_at,
            expires_at: fetched_at.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }
}

/// Shared page cache. Writes are visible to subsequent reads from any worker.
#[async_trait]
pub trait PageCache: Send + Sync {
    /// Look up a live entry; `None` on miss or expiry.
    async fn get(&self, key: &str) -> Option<CachedResponse>;

    /// Store a body, replacing any previous entry for the key.
    async fn put(&self, key: &str, body: &str, ttl: Duration);

    /// Drop expired entries. Returns how many were removed.
    async fn purge_expired(&self) -> usize;
}
