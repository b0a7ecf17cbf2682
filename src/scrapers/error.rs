//! Scraper error types.

use thiserror::Error;

/// A listing page could not be fetched.
///
/// Non-fatal: the page contributes zero records and the batch continues.
#[derive(Debug, Clone, Error)]
#[error("Failed to fetch {url}: {cause}")]
pub struct FetchError {
    pub url: String,
    pub cause: FetchErrorKind,
}

impl FetchError {
    pub fn new(url: &str, cause: FetchErrorKind) -> Self {
        Self {
            url: url.to_string(),
            cause,
        }
    }

    /// Classify a reqwest error.
    pub fn from_reqwest(url: &str, e: &reqwest::Error) -> Self {
        let cause = match e.status() {
            Some(status) => FetchErrorKind::Status(status.as_u16()),
            None if e.is_body() || e.is_decode() => FetchErrorKind::Body(e.to_string()),
            None => FetchErrorKind::Transport(e.to_string()),
        };
        Self::new(url, cause)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchErrorKind {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("failed to read body: {0}")]
    Body(String),
    #[error("worker task failed: {0}")]
    Worker(String),
}

/// A single listing card could not be turned into a candidate.
///
/// Scoped to one candidate; extraction continues with the next card.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid event link {href:?}: {reason}")]
    InvalidUrl { href: String, reason: String },
    #[error("card is missing {0}")]
    MissingElement(&'static str),
}

/// The extractor configuration could not be compiled.
#[derive(Debug, Clone, Error)]
pub enum ExtractorConfigError {
    #[error("invalid CSS selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },
    #[error("invalid date pattern {pattern:?}: {reason}")]
    Pattern { pattern: String, reason: String },
    #[error("invalid base URL {url:?}: {reason}")]
    BaseUrl { url: String, reason: String },
}
