//! Multi-source scrape runs.
//!
//! Sources are processed one after another, each with its own SeenSet.
//! After each source the notifier is told how many events were saved (or
//! why saving failed), then the service pauses before the next source.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::models::SourceReport;
use crate::notify::{persist_failed_message, scraped_message, Notifier};
use crate::scrapers::{BatchScheduler, SourceSpec};

/// Result of a full run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub sources: Vec<SourceReport>,
    /// True if the run stopped early on shutdown.
    pub cancelled: bool,
}

impl RunReport {
    pub fn records_novel(&self) -> usize {
        self.sources.iter().map(|s| s.records_novel()).sum()
    }

    pub fn fetch_failures(&self) -> usize {
        self.sources.iter().map(|s| s.fetch_failures()).sum()
    }
}

/// Runs a list of sources through the batch scheduler.
pub struct ScrapeService {
    scheduler: BatchScheduler,
    notifier: Arc<dyn Notifier>,
    inter_source_delay: Duration,
    shutdown: Arc<AtomicBool>,
}

impl ScrapeService {
    /// Create a new scrape service. The scheduler should share `shutdown`.
    pub fn new(
        scheduler: BatchScheduler,
        notifier: Arc<dyn Notifier>,
        inter_source_delay: Duration,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            scheduler: scheduler.with_shutdown(shutdown.clone()),
            notifier,
            inter_source_delay,
            shutdown,
        }
    }

    fn cancelled(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    pub async fn run(&self, sources: &[SourceSpec]) -> RunReport {
        let mut run = RunReport::default();

        for (i, source) in sources.iter().enumerate() {
            if i > 0 {
                debug!(
                    "Pausing {:?} before {}",
                    self.inter_source_delay, source.collection
                );
                tokio::time::sleep(self.inter_source_delay).await;
            }
            if self.cancelled() {
                run.cancelled = true;
                break;
            }

            info!(
                "Scraping {} ({} pages, batches of {})",
                source.collection, source.max_pages, source.batch_size
            );
            let report = self.scheduler.run_source(source).await;
            info!(
                "{}: {} pages, {} found, {} novel, {} saved, {} fetch failures",
                report.collection,
                report.pages_attempted(),
                report.records_found(),
                report.records_novel(),
                report.inserted(),
                report.fetch_failures()
            );

            self.notify_source(&report).await;

            let stop = report.cancelled;
            run.sources.push(report);
            if stop {
                run.cancelled = true;
                break;
            }
        }

        run
    }

    async fn notify_source(&self, report: &SourceReport) {
        if report.inserted() > 0 {
            self.notifier
                .notify(&scraped_message(report.inserted(), &report.collection))
                .await;
        }
        if let Some(error) = report.persist_error() {
            self.notifier
                .notify(&persist_failed_message(
                    report.persist_failures(),
                    &report.collection,
                    error,
                ))
                .await;
        }
    }
}
