//! Batched page processing for one source.
//!
//! Pages `1..=max_pages` are split into fixed-size batches. Every page of a
//! batch runs as its own task (fetch, extract, dedup); the batch is joined
//! before its novel events are written, and the scheduler sleeps before
//! dispatching the next batch. No task of batch N+1 starts before every task
//! of batch N has finished.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::dedup::DedupGate;
use super::error::{FetchError, FetchErrorKind};
use super::extract::EventExtractor;
use super::fetcher::Fetcher;
use crate::models::{BatchReport, CandidateEvent, Event, PageReport, PageRequest, SourceReport};
use crate::repository::EventStore;

/// One listing source to scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub base_url: String,
    pub collection: String,
    pub max_pages: u32,
    pub batch_size: usize,
}

impl SourceSpec {
    pub fn new(base_url: &str, collection: &str, max_pages: u32, batch_size: usize) -> Self {
        Self {
            base_url: base_url.to_string(),
            collection: collection.to_string(),
            max_pages,
            batch_size,
        }
    }

    /// Page requests grouped into batches.
    pub fn batches(&self) -> Vec<Vec<PageRequest>> {
        partition(self.max_pages, self.batch_size)
            .into_iter()
            .map(|pages| {
                pages
                    .into_iter()
                    .map(|index| PageRequest::new(&self.base_url, index))
                    .collect()
            })
            .collect()
    }
}

/// Split `1..=max_pages` into consecutive chunks of `batch_size` (at least 1).
pub fn partition(max_pages: u32, batch_size: usize) -> Vec<Vec<u32>> {
    let pages: Vec<u32> = (1..=max_pages).collect();
    pages
        .chunks(batch_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}

pub struct BatchScheduler {
    fetcher: Arc<Fetcher>,
    extractor: Arc<EventExtractor>,
    store: Arc<dyn EventStore>,
    inter_batch_delay: Duration,
    shutdown: Arc<AtomicBool>,
}

impl BatchScheduler {
    pub fn new(
        fetcher: Fetcher,
        extractor: EventExtractor,
        store: Arc<dyn EventStore>,
        inter_batch_delay: Duration,
    ) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(extractor),
            store,
            inter_batch_delay,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stop at the next batch boundary once `flag` is set.
    pub fn with_shutdown(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = flag;
        self
    }

    fn cancelled(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Process every batch of one source with a fresh SeenSet.
    pub async fn run_source(&self, source: &SourceSpec) -> SourceReport {
        let gate = Arc::new(DedupGate::new(&source.collection, self.store.clone()));
        let mut report = SourceReport {
            collection: source.collection.clone(),
            batches: Vec::new(),
            cancelled: false,
        };

        for (number, requests) in source.batches().into_iter().enumerate() {
            if number > 0 {
                if self.cancelled() {
                    report.cancelled = true;
                    break;
                }
                debug!(
                    "{}: pausing {:?} before batch {}",
                    source.collection,
                    self.inter_batch_delay,
                    number + 1
                );
                tokio::time::sleep(self.inter_batch_delay).await;
            }
            if self.cancelled() {
                report.cancelled = true;
                break;
            }

            let batch = self.run_batch(number, requests, &gate).await;
            info!(
                "{}: batch {} done, {} pages, {} found, {} novel, {} fetch failures",
                source.collection,
                number + 1,
                batch.pages.len(),
                batch.records_found(),
                batch.records_novel(),
                batch.fetch_failures()
            );
            report.batches.push(batch);
        }

        if report.cancelled {
            warn!(
                "{}: stopped after {} of {} pages",
                source.collection,
                report.pages_attempted(),
                source.max_pages
            );
        }

        report
    }

    async fn run_batch(
        &self,
        number: usize,
        requests: Vec<PageRequest>,
        gate: &Arc<DedupGate>,
    ) -> BatchReport {
        let dispatched_at = Instant::now();

        let handles: Vec<_> = requests
            .iter()
            .cloned()
            .map(|request| {
                let fetcher = self.fetcher.clone();
                let extractor = self.extractor.clone();
                let gate = gate.clone();
                tokio::spawn(
                    async move { process_page(request, &fetcher, &extractor, &gate).await },
                )
            })
            .collect();

        let results = join_all(handles).await;
        let joined_at = Instant::now();

        let mut pages = Vec::with_capacity(results.len());
        let mut novel: Vec<Event> = Vec::new();
        for (request, result) in requests.into_iter().zip(results) {
            match result {
                Ok((page, accepted)) => {
                    novel.extend(
                        accepted
                            .into_iter()
                            .map(|c| c.into_event(gate.collection())),
                    );
                    pages.push(page);
                }
                Err(e) => {
                    error!("Worker for {} failed: {}", request, e);
                    let err = FetchError::new(&request.url, FetchErrorKind::Worker(e.to_string()));
                    pages.push(PageReport::fetch_failed(request, err));
                }
            }
        }

        let mut batch = BatchReport {
            number,
            pages,
            inserted: 0,
            persist_failed: 0,
            persist_error: None,
            dispatched_at,
            joined_at,
        };

        if !novel.is_empty() {
            match self.store.insert_many(gate.collection(), &novel).await {
                Ok(inserted) => batch.inserted = inserted,
                Err(e) => {
                    // SeenSet entries stay claimed; these events are retried next run
                    error!(
                        "Failed to save {} events for {}: {}",
                        novel.len(),
                        gate.collection(),
                        e
                    );
                    batch.persist_failed = novel.len();
                    batch.persist_error = Some(e.to_string());
                }
            }
        }

        batch
    }
}

/// Fetch, extract and dedup one page. Never fails: errors land in the report.
async fn process_page(
    request: PageRequest,
    fetcher: &Fetcher,
    extractor: &EventExtractor,
    gate: &DedupGate,
) -> (PageReport, Vec<CandidateEvent>) {
    let body = match fetcher.fetch(&request.url).await {
        Ok(body) => body,
        Err(e) => {
            warn!("{}", e);
            return (PageReport::fetch_failed(request, e), Vec::new());
        }
    };

    let extraction = extractor.extract(&body);
    for failure in &extraction.failures {
        debug!("Skipping card on {}: {}", request, failure);
    }

    let mut report = PageReport {
        records_found: extraction.events.len(),
        records_novel: 0,
        parse_failures: extraction.failures.len(),
        lookup_failures: 0,
        fetch_error: None,
        request,
    };

    let mut accepted = Vec::new();
    for candidate in extraction.events {
        match gate.accept(&candidate).await {
            Ok(true) => accepted.push(candidate),
            Ok(false) => {}
            Err(e) => {
                warn!(
                    "Existence check failed for {:?} on {}: {}",
                    candidate.title, report.request, e
                );
                report.lookup_failures += 1;
            }
        }
    }
    report.records_novel = accepted.len();

    (report, accepted)
}
