//! Event models: extracted candidates, persisted events and their identity.
//!
//! A listing page yields zero or more [`CandidateEvent`]s. Candidates that
//! survive deduplication become [`Event`]s bound to a collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder for a field that could not be extracted.
///
/// A title equal to this value marks the candidate for discard; it is a
/// filter signal, not an error.
pub const SENTINEL: &str = "N/A";

/// An event extracted from a single listing card, before deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateEvent {
    pub title: String,
    pub date: String,
    pub location: String,
    /// Absolute URL of the event page (empty when the card has no link).
    pub url: String,
}

impl CandidateEvent {
    /// True when the title could not be resolved.
    pub fn has_sentinel_title(&self) -> bool {
        self.title == SENTINEL
    }

    /// Identity used to decide novelty.
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(&self.title, &self.date, &self.location)
    }

    /// Bind this candidate to a collection as a new event.
    pub fn into_event(self, collection: &str) -> Event {
        Event {
            id: uuid::Uuid::new_v4().to_string(),
            collection: collection.to_string(),
            title: self.title,
            date: self.date,
            location: self.location,
            url: self.url,
            scraped_at: Utc::now(),
        }
    }
}

/// Uniqueness criterion for events: `(title, date, location)`.
///
/// Two events with equal keys in the same collection are the same logical
/// event; only the first one seen is kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DedupKey {
    pub title: String,
    pub date: String,
    pub location: String,
}

impl DedupKey {
    pub fn new(title: &str, date: &str, location: &str) -> Self {
        Self {
            title: title.to_string(),
            date: date.to_string(),
            location: location.to_string(),
        }
    }
}

/// A persisted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    /// Collection (logical source) this event belongs to, e.g. `princeton`.
    pub collection: String,
    pub title: String,
    pub date: String,
    pub location: String,
    pub url: String,
    pub scraped_at: DateTime<Utc>,
}

impl Event {
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(&self.title, &self.date, &self.location)
    }
}
