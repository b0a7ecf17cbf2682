//! In-memory page cache.
//!
//! Expiry is tracked with `tokio::time::Instant`, so it follows the tokio
//! clock (and can be driven by a paused clock in tests).

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{CachedResponse, PageCache};

/// A cached value with expiration time.
struct CacheEntry {
    response: CachedResponse,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(response: CachedResponse, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            response,
            expires_at: now.checked_add(ttl).unwrap_or(now + Duration::from_secs(86400 * 365)),
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[derive(Default)]
pub struct MemoryPageCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryPageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PageCache for MemoryPageCache {
    async fn get(&self, key: &str) -> Option<CachedResponse> {
        self.entries.read().ok().and_then(|guard| {
            guard
                .get(key)
                .filter(|entry| !entry.is_expired())
                .map(|entry| entry.response.clone())
        })
    }

    async fn put(&self, key: &str, body: &str, ttl: Duration) {
        if let Ok(mut guard) = self.entries.write() {
            guard.insert(
                key.to_string(),
                CacheEntry::new(CachedResponse::new(key, body, ttl), ttl),
            );
        }
    }

    async fn purge_expired(&self) -> usize {
        match self.entries.write() {
            Ok(mut guard) => {
                let before = guard.len();
                guard.retain(|_, entry| !entry.is_expired());
                before - guard.len()
            }
            Err(_) => 0,
        }
    }
}
