//! Database context for managing the connection pool and repository access.
//!
//! Create one context per command, then use it to access all repositories.
//!
//! # Example
//! ```ignore
//! let ctx = DbContext::from_url("sqlite:data/eventscrape.db");
//! ctx.init_schema().await?;
//! let recent = ctx.events().recent("princeton", 5).await?;
//! ```

use std::path::Path;

use diesel_async::SimpleAsyncConnection;

use super::diesel_event::DieselEventRepository;
use super::pool::{DbError, DbPool};
use crate::scrapers::SqlitePageCache;

#[derive(Clone)]
pub struct DbContext {
    pool: DbPool,
}

impl DbContext {
    /// Create a new database context from a database URL or file path.
    pub fn from_url(database_url: &str) -> Self {
        Self {
            pool: DbPool::new(database_url),
        }
    }

    /// Create a new database context from a file path.
    pub fn from_path(db_path: &Path) -> Self {
        Self {
            pool: DbPool::from_path(db_path),
        }
    }

    /// Get an event repository.
    pub fn events(&self) -> DieselEventRepository {
        DieselEventRepository::new(self.pool.clone())
    }

    /// Get a persistent page cache.
    pub fn page_cache(&self) -> SqlitePageCache {
        SqlitePageCache::new(self.pool.clone())
    }

    /// Initialize all database schemas.
    ///
    /// This creates the necessary tables if they don't exist.
    pub async fn init_schema(&self) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        conn.batch_execute(
            r#"
            PRAGMA journal_mode = WAL;

            -- Events table
            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY NOT NULL,
                collection TEXT NOT NULL,
                title TEXT NOT NULL,
                date TEXT NOT NULL,
                location TEXT NOT NULL,
                url TEXT NOT NULL DEFAULT '',
                scraped_at TEXT NOT NULL,
                UNIQUE(collection, title, date, location)
            );
            CREATE INDEX IF NOT EXISTS idx_events_recent ON events(collection, scraped_at);

            -- Fetched listing pages
            CREATE TABLE IF NOT EXISTS page_cache (
                key TEXT PRIMARY KEY NOT NULL,
                body TEXT NOT NULL,
                fetched_at BIGINT NOT NULL,
                expires_at BIGINT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_page_cache_expires ON page_cache(expires_at);
            "#,
        )
        .await
    }
}
