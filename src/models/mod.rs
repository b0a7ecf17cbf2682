//! Data models for the event scraper.

mod event;
mod page;

pub use event::{CandidateEvent, DedupKey, Event, SENTINEL};
pub use page::{BatchReport, PageReport, PageRequest, SourceReport};
