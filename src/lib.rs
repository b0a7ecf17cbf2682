//! eventscrape - batched event listing scraper.
//!
//! Fetches paginated listing pages in concurrent batches, extracts events,
//! drops ones already seen this run or stored by earlier runs, and writes
//! the rest to SQLite.

pub mod cli;
pub mod config;
pub mod models;
pub mod notify;
pub mod repository;
pub mod schema;
pub mod scrapers;
pub mod services;
