//! Service layer for eventscrape business logic.
//!
//! This module contains domain logic separated from UI concerns.

pub mod scrape;

pub use scrape::{RunReport, ScrapeService};
