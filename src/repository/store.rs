//! Pluggable event store trait.
//!
//! The scraping pipeline only needs two capabilities from durable storage:
//! an existence check by dedup key and an idempotent bulk insert. Keeping
//! them behind a trait lets the scheduler run against SQLite or an
//! in-memory store in tests.

use async_trait::async_trait;

use crate::models::{DedupKey, Event};

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from event store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Durable storage for events, scoped by collection.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Check whether an event with this key already exists in the collection.
    async fn exists_by_key(&self, collection: &str, key: &DedupKey) -> StoreResult<bool>;

    /// Insert events, ignoring any whose key already exists.
    ///
    /// Returns the number of rows actually written.
    async fn insert_many(&self, collection: &str, events: &[Event]) -> StoreResult<usize>;

    /// Most recently scraped events in a collection, newest first.
    async fn recent(&self, collection: &str, limit: usize) -> StoreResult<Vec<Event>>;
}
