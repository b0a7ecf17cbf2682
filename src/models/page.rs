//! Page requests and the reports rolled up from processing them.

use std::fmt;

use tokio::time::Instant;

use crate::scrapers::FetchError;

/// One listing page to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub url: String,
    /// 1-based page number.
    pub index: u32,
}

impl PageRequest {
    /// Expand a base URL into `{base_url}?page={index}`.
    pub fn new(base_url: &str, index: u32) -> Self {
        let separator = if base_url.contains('?') { '&' } else { '?' };
        Self {
            url: format!("{}{}page={}", base_url, separator, index),
            index,
        }
    }
}

impl fmt::Display for PageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page {} ({})", self.index, self.url)
    }
}

/// Outcome of processing a single page.
#[derive(Debug)]
pub struct PageReport {
    pub request: PageRequest,
    /// Candidates emitted by the extractor (sentinel titles excluded).
    pub records_found: usize,
    /// Candidates accepted by the dedup gate.
    pub records_novel: usize,
    /// Candidates skipped because a single card failed to parse.
    pub parse_failures: usize,
    /// Candidates skipped because the existence lookup failed.
    pub lookup_failures: usize,
    pub fetch_error: Option<FetchError>,
}

impl PageReport {
    pub fn fetch_failed(request: PageRequest, error: FetchError) -> Self {
        Self {
            request,
            records_found: 0,
            records_novel: 0,
            parse_failures: 0,
            lookup_failures: 0,
            fetch_error: Some(error),
        }
    }
}

/// Outcome of one batch: every page report plus persistence of its novel events.
#[derive(Debug)]
pub struct BatchReport {
    /// 0-based batch number within the source.
    pub number: usize,
    pub pages: Vec<PageReport>,
    /// Rows actually written by the store.
    pub inserted: usize,
    /// Novel events the store failed to write.
    pub persist_failed: usize,
    pub persist_error: Option<String>,
    /// When the first worker of this batch was started.
    pub dispatched_at: Instant,
    /// When the last worker of this batch finished.
    pub joined_at: Instant,
}

impl BatchReport {
    pub fn records_found(&self) -> usize {
        self.pages.iter().map(|p| p.records_found).sum()
    }

    pub fn records_novel(&self) -> usize {
        self.pages.iter().map(|p| p.records_novel).sum()
    }

    pub fn fetch_failures(&self) -> usize {
        self.pages.iter().filter(|p| p.fetch_error.is_some()).count()
    }
}

/// Roll-up for one source (one collection).
#[derive(Debug)]
pub struct SourceReport {
    pub collection: String,
    pub batches: Vec<BatchReport>,
    /// True if the run stopped at a batch boundary before all pages were processed.
    pub cancelled: bool,
}

impl SourceReport {
    pub fn pages_attempted(&self) -> usize {
        self.batches.iter().map(|b| b.pages.len()).sum()
    }

    pub fn records_found(&self) -> usize {
        self.batches.iter().map(|b| b.records_found()).sum()
    }

    pub fn records_novel(&self) -> usize {
        self.batches.iter().map(|b| b.records_novel()).sum()
    }

    pub fn inserted(&self) -> usize {
        self.batches.iter().map(|b| b.inserted).sum()
    }

    pub fn fetch_failures(&self) -> usize {
        self.batches.iter().map(|b| b.fetch_failures()).sum()
    }

    pub fn parse_failures(&self) -> usize {
        self.batches
            .iter()
            .flat_map(|b| b.pages.iter())
            .map(|p| p.parse_failures)
            .sum()
    }

    pub fn lookup_failures(&self) -> usize {
        self.batches
            .iter()
            .flat_map(|b| b.pages.iter())
            .map(|p| p.lookup_failures)
            .sum()
    }

    pub fn persist_failures(&self) -> usize {
        self.batches.iter().map(|b| b.persist_failed).sum()
    }

    /// First persistence error seen for this source, if any.
    pub fn persist_error(&self) -> Option<&str> {
        self.batches
            .iter()
            .find_map(|b| b.persist_error.as_deref())
    }

    /// Find the report for a given page number.
    pub fn page(&self, index: u32) -> Option<&PageReport> {
        self.batches
            .iter()
            .flat_map(|b| b.pages.iter())
            .find(|p| p.request.index == index)
    }
}
