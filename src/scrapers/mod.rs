//! Listing page pipeline: fetch, cache, extract, dedup and batch scheduling.

pub mod cache;
pub mod config;
pub mod dedup;
mod error;
pub mod extract;
pub mod fetcher;
mod http_client;
pub mod scheduler;

pub use cache::{CachedResponse, MemoryPageCache, PageCache, SqlitePageCache};
pub use config::{CacheBackend, ExtractorConfig, ScrapeConfig, SourceConfig};
pub use dedup::{DedupGate, SeenSet};
pub use error::{ExtractorConfigError, FetchError, FetchErrorKind, ParseError};
pub use extract::{EventExtractor, Extraction};
pub use fetcher::{Fetcher, UserAgentPolicy, BROWSER_USER_AGENTS};
pub use http_client::{HttpClient, PageTransport};
pub use scheduler::{partition, BatchScheduler, SourceSpec};
