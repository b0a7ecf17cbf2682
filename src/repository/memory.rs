//! In-memory event store for single-process operation.
//!
//! Used for dry runs and tests. State is not persisted across restarts.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::store::{EventStore, StoreError, StoreResult};
use crate::models::{DedupKey, Event};

#[derive(Default)]
struct Collection {
    keys: HashSet<DedupKey>,
    events: Vec<Event>,
}

/// Lock-based in-memory store.
#[derive(Default)]
pub struct MemoryEventStore {
    collections: RwLock<HashMap<String, Collection>>,
    lookups: AtomicUsize,
    fail_inserts: AtomicBool,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a collection with already-known events.
    pub async fn seed(&self, collection: &str, events: Vec<Event>) {
        let mut guard = self.collections.write().await;
        let entry = guard.entry(collection.to_string()).or_default();
        for event in events {
            if entry.keys.insert(event.dedup_key()) {
                entry.events.push(event);
            }
        }
    }

    /// Make every subsequent `insert_many` fail (simulates a store outage).
    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Number of `exists_by_key` calls served.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// All events stored in a collection, in insertion order.
    pub async fn events(&self, collection: &str) -> Vec<Event> {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|c| c.events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn exists_by_key(&self, collection: &str, key: &DedupKey) -> StoreResult<bool> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .is_some_and(|c| c.keys.contains(key)))
    }

    async fn insert_many(&self, collection: &str, events: &[Event]) -> StoreResult<usize> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("inserts disabled".to_string()));
        }

        let mut guard = self.collections.write().await;
        let entry = guard.entry(collection.to_string()).or_default();
        let mut inserted = 0;
        for event in events {
            if entry.keys.insert(event.dedup_key()) {
                entry.events.push(event.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn recent(&self, collection: &str, limit: usize) -> StoreResult<Vec<Event>> {
        let mut events = self.events(collection).await;
        events.sort_by(|a, b| b.scraped_at.cmp(&a.scraped_at));
        events.truncate(limit);
        Ok(events)
    }
}
