//! Diesel-based event repository for SQLite.
//!
//! Uses diesel-async's SyncConnectionWrapper to provide an async interface
//! while maintaining Diesel's compile-time query checking.

use async_trait::async_trait;
use chrono::SecondsFormat;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::diesel_models::{EventRecord, NewEvent};
use super::pool::DbPool;
use super::store::{EventStore, StoreResult};
use super::util::parse_datetime;
use crate::models::{DedupKey, Event};
use crate::schema::events;

/// Convert a database record to a domain model.
impl From<EventRecord> for Event {
    fn from(record: EventRecord) -> Self {
        Event {
            id: record.id,
            collection: record.collection,
            title: record.title,
            date: record.date,
            location: record.location,
            url: record.url,
            scraped_at: parse_datetime(&record.scraped_at),
        }
    }
}

/// Diesel-based event repository with compile-time query checking.
#[derive(Clone)]
pub struct DieselEventRepository {
    pool: DbPool,
}

impl DieselEventRepository {
    /// Create a new Diesel event repository with an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Count events in a collection.
    pub async fn count(&self, collection: &str) -> StoreResult<u64> {
        let mut conn = self.pool.get().await?;

        let count: i64 = events::table
            .filter(events::collection.eq(collection))
            .select(count_star())
            .first(&mut conn)
            .await?;

        Ok(count as u64)
    }
}

#[async_trait]
impl EventStore for DieselEventRepository {
    async fn exists_by_key(&self, collection: &str, key: &DedupKey) -> StoreResult<bool> {
        let mut conn = self.pool.get().await?;

        let count: i64 = events::table
            .filter(events::collection.eq(collection))
            .filter(events::title.eq(&key.title))
            .filter(events::date.eq(&key.date))
            .filter(events::location.eq(&key.location))
            .select(count_star())
            .first(&mut conn)
            .await?;

        Ok(count > 0)
    }

    async fn insert_many(&self, collection: &str, batch: &[Event]) -> StoreResult<usize> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut conn = self.pool.get().await?;

        // One transaction per batch; UNIQUE(collection, title, date, location)
        // turns a row another writer already stored into a no-op.
        let inserted = conn
            .transaction(|conn| {
                Box::pin(async move {
                    let mut inserted = 0;
                    for event in batch {
                        let scraped_at = event
                            .scraped_at
                            .to_rfc3339_opts(SecondsFormat::Micros, true);
                        inserted += diesel::insert_or_ignore_into(events::table)
                            .values(NewEvent {
                                id: &event.id,
                                collection,
                                title: &event.title,
                                date: &event.date,
                                location: &event.location,
                                url: &event.url,
                                scraped_at,
                            })
                            .execute(conn)
                            .await?;
                    }
                    Ok::<usize, diesel::result::Error>(inserted)
                })
            })
            .await?;

        Ok(inserted)
    }

    async fn recent(&self, collection: &str, limit: usize) -> StoreResult<Vec<Event>> {
        let mut conn = self.pool.get().await?;

        events::table
            .filter(events::collection.eq(collection))
            .order(events::scraped_at.desc())
            .limit(limit as i64)
            .select(EventRecord::as_select())
            .load::<EventRecord>(&mut conn)
            .await
            .map(|records| records.into_iter().map(Event::from).collect())
            .map_err(Into::into)
    }
}
