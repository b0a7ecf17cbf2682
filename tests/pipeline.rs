//! End-to-end pipeline tests: stub transport, in-memory store, paused clock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use eventscrape::models::CandidateEvent;
use eventscrape::notify::Notifier;
use eventscrape::repository::{EventStore, MemoryEventStore};
use eventscrape::scrapers::{
    BatchScheduler, DedupGate, EventExtractor, ExtractorConfig, FetchError, FetchErrorKind,
    Fetcher, MemoryPageCache, PageTransport, SourceSpec,
};
use eventscrape::services::ScrapeService;

const BASE: &str = "https://listings.test/d/nj--princeton/all-events/";
const PAGE_LATENCY: Duration = Duration::from_secs(1);
const INTER_BATCH: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
struct Call {
    url: String,
    started: Instant,
    finished: Instant,
}

/// Serves canned pages after a fixed latency and records timing per call.
#[derive(Default)]
struct StubTransport {
    pages: HashMap<String, String>,
    failing: Vec<String>,
    calls: Mutex<Vec<Call>>,
}

impl StubTransport {
    fn page(mut self, base: &str, index: u32, body: String) -> Self {
        self.pages.insert(page_url(base, index), body);
        self
    }

    fn failing(mut self, base: &str, index: u32) -> Self {
        self.failing.push(page_url(base, index));
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageTransport for StubTransport {
    async fn get_text(&self, url: &str, _user_agent: &str) -> Result<String, FetchError> {
        let started = Instant::now();
        tokio::time::sleep(PAGE_LATENCY).await;
        self.calls.lock().unwrap().push(Call {
            url: url.to_string(),
            started,
            finished: Instant::now(),
        });

        if self.failing.iter().any(|u| u == url) {
            return Err(FetchError::new(
                url,
                FetchErrorKind::Transport("connection reset".to_string()),
            ));
        }
        Ok(self.pages.get(url).cloned().unwrap_or_default())
    }
}

/// Collects every message instead of sending it.
#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str) -> bool {
        self.messages.lock().unwrap().push(text.to_string());
        true
    }
}

fn page_url(base: &str, index: u32) -> String {
    format!("{}?page={}", base, index)
}

fn card(title: &str, date: &str, href: &str) -> String {
    format!(
        r#"<div data-testid="event-card">
             <a href="{href}" data-event-location="NJ"><h3>{title}</h3></a>
             <p>{date}</p>
           </div>"#
    )
}

fn listing(cards: &[String]) -> String {
    format!("<html><body>{}</body></html>", cards.concat())
}

fn extractor() -> EventExtractor {
    EventExtractor::from_config(&ExtractorConfig::default()).unwrap()
}

fn scheduler(transport: Arc<StubTransport>, store: Arc<MemoryEventStore>) -> BatchScheduler {
    BatchScheduler::new(Fetcher::new(transport), extractor(), store, INTER_BATCH)
}

#[tokio::test(start_paused = true)]
async fn batches_are_joined_and_paced() {
    let transport = Arc::new(
        StubTransport::default()
            .page(BASE, 1, listing(&[card("A", "Jun 1", "/e/a")]))
            .page(BASE, 2, listing(&[card("B", "Jun 2", "/e/b")]))
            .page(BASE, 3, listing(&[card("C", "Jun 3", "/e/c")])),
    );
    let store = Arc::new(MemoryEventStore::new());
    let source = SourceSpec::new(BASE, "princeton", 3, 2);

    let report = scheduler(transport.clone(), store.clone())
        .run_source(&source)
        .await;

    assert_eq!(report.batches.len(), 2);
    let indices: Vec<Vec<u32>> = report
        .batches
        .iter()
        .map(|b| {
            let mut pages: Vec<u32> = b.pages.iter().map(|p| p.request.index).collect();
            pages.sort();
            pages
        })
        .collect();
    assert_eq!(indices, vec![vec![1, 2], vec![3]]);

    let first = &report.batches[0];
    let second = &report.batches[1];
    assert!(second.dispatched_at >= first.joined_at + INTER_BATCH);

    // Barrier: every page of batch 2 starts after every page of batch 1 finished
    let calls = transport.calls();
    let last_finish_batch1 = calls
        .iter()
        .filter(|c| c.url != page_url(BASE, 3))
        .map(|c| c.finished)
        .max()
        .unwrap();
    let start_page3 = calls
        .iter()
        .find(|c| c.url == page_url(BASE, 3))
        .unwrap()
        .started;
    assert!(start_page3 >= last_finish_batch1 + INTER_BATCH);

    // Pages within a batch run concurrently
    let batch1: Vec<&Call> = calls
        .iter()
        .filter(|c| c.url != page_url(BASE, 3))
        .collect();
    assert_eq!(batch1[0].started, batch1[1].started);

    assert_eq!(report.records_novel(), 3);
    assert_eq!(report.inserted(), 3);
    assert_eq!(store.events("princeton").await.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn duplicate_across_pages_persisted_once() {
    let jazz = card("Jazz Night", "Jun 1", "/e/jazz");
    let transport = Arc::new(
        StubTransport::default()
            .page(BASE, 1, listing(&[jazz.clone(), card("Poetry", "Jun 2", "/e/p")]))
            .page(BASE, 2, listing(&[jazz])),
    );
    let store = Arc::new(MemoryEventStore::new());
    let source = SourceSpec::new(BASE, "princeton", 2, 2);

    let report = scheduler(transport, store.clone()).run_source(&source).await;

    assert_eq!(report.records_found(), 3);
    assert_eq!(report.records_novel(), 2);
    let events = store.events("princeton").await;
    assert_eq!(
        events.iter().filter(|e| e.title == "Jazz Night").count(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn fetch_failure_is_isolated() {
    let transport = Arc::new(
        StubTransport::default()
            .page(BASE, 1, listing(&[card("A", "Jun 1", "/e/a")]))
            .failing(BASE, 2)
            .page(BASE, 3, listing(&[card("C", "Jun 3", "/e/c"), card("D", "Jun 4", "/e/d")])),
    );
    let store = Arc::new(MemoryEventStore::new());
    let source = SourceSpec::new(BASE, "princeton", 3, 3);

    let report = scheduler(transport, store.clone()).run_source(&source).await;

    assert_eq!(report.pages_attempted(), 3);
    assert_eq!(report.fetch_failures(), 1);

    let failed = report.page(2).unwrap();
    assert_eq!(failed.records_found, 0);
    assert!(matches!(
        failed.fetch_error.as_ref().map(|e| &e.cause),
        Some(FetchErrorKind::Transport(_))
    ));
    assert_eq!(report.page(1).unwrap().records_novel, 1);
    assert_eq!(report.page(3).unwrap().records_novel, 2);
    assert_eq!(store.events("princeton").await.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn faulty_card_skipped_rest_of_page_kept() {
    let cards: Vec<String> = (0..5)
        .map(|i| {
            let href = if i == 3 {
                "http://[bad".to_string()
            } else {
                format!("/e/{}", i)
            };
            card(&format!("Event {}", i), "Jun 1", &href)
        })
        .collect();
    let transport = Arc::new(StubTransport::default().page(BASE, 1, listing(&cards)));
    let store = Arc::new(MemoryEventStore::new());

    let report = scheduler(transport, store)
        .run_source(&SourceSpec::new(BASE, "princeton", 1, 1))
        .await;

    let page = report.page(1).unwrap();
    assert_eq!(page.records_found, 4);
    assert_eq!(page.parse_failures, 1);
    assert_eq!(page.records_novel, 4);
    assert!(page.fetch_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn sentinel_titles_never_reach_the_store() {
    let untitled = r#"<div data-testid="event-card"><a href="/e/x">more</a><p>Jun 1</p></div>"#;
    let transport = Arc::new(
        StubTransport::default().page(BASE, 1, listing(&[untitled.to_string(), untitled.to_string()])),
    );
    let store = Arc::new(MemoryEventStore::new());

    let report = scheduler(transport, store.clone())
        .run_source(&SourceSpec::new(BASE, "princeton", 1, 1))
        .await;

    assert_eq!(report.records_found(), 0);
    assert_eq!(store.lookups(), 0);
}

#[tokio::test]
async fn gate_accepts_once_and_rejects_stored() {
    let store = Arc::new(MemoryEventStore::new());
    let stored = CandidateEvent {
        title: "Book Fair".to_string(),
        date: "Jun 2".to_string(),
        location: "NJ".to_string(),
        url: String::new(),
    };
    store
        .seed("princeton", vec![stored.clone().into_event("princeton")])
        .await;

    let gate = DedupGate::new("princeton", store.clone());
    let jazz = CandidateEvent {
        title: "Jazz Night".to_string(),
        ..stored.clone()
    };

    assert!(gate.accept(&jazz).await.unwrap());
    assert!(!gate.accept(&jazz).await.unwrap());
    assert!(!gate.accept(&stored).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn persistence_failure_reported_and_notified() {
    let transport = Arc::new(
        StubTransport::default().page(BASE, 1, listing(&[card("A", "Jun 1", "/e/a")])),
    );
    let store = Arc::new(MemoryEventStore::new());
    store.set_fail_inserts(true);
    let notifier = Arc::new(RecordingNotifier::default());

    let service = ScrapeService::new(
        scheduler(transport, store.clone()),
        notifier.clone(),
        Duration::from_secs(60),
        Arc::new(AtomicBool::new(false)),
    );
    let run = service
        .run(&[SourceSpec::new(BASE, "princeton", 1, 1)])
        .await;

    let source = &run.sources[0];
    assert_eq!(source.records_novel(), 1);
    assert_eq!(source.inserted(), 0);
    assert_eq!(source.persist_failures(), 1);
    assert_eq!(
        notifier.messages.lock().unwrap().clone(),
        vec!["Failed to save 1 events for princeton: Store unavailable: inserts disabled"]
    );
}

#[tokio::test(start_paused = true)]
async fn sources_run_in_order_with_pause_and_notifications() {
    let newark = "https://listings.test/d/nj--newark/all-events/";
    let transport = Arc::new(
        StubTransport::default()
            .page(BASE, 1, listing(&[card("A", "Jun 1", "/e/a"), card("B", "Jun 1", "/e/b")]))
            .page(newark, 1, listing(&[])),
    );
    let store = Arc::new(MemoryEventStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let inter_source = Duration::from_secs(2900);

    let service = ScrapeService::new(
        scheduler(transport.clone(), store),
        notifier.clone(),
        inter_source,
        Arc::new(AtomicBool::new(false)),
    );
    let started = Instant::now();
    let run = service
        .run(&[
            SourceSpec::new(BASE, "princeton", 1, 1),
            SourceSpec::new(newark, "newark", 1, 1),
        ])
        .await;

    let collections: Vec<&str> = run.sources.iter().map(|s| s.collection.as_str()).collect();
    assert_eq!(collections, vec!["princeton", "newark"]);
    assert!(!run.cancelled);

    let calls = transport.calls();
    let princeton_done = calls[0].finished;
    assert!(calls[1].started >= princeton_done + inter_source);
    // No pause after the last source
    assert!(Instant::now() < started + inter_source * 2);

    // Only sources that saved events are announced
    assert_eq!(
        notifier.messages.lock().unwrap().clone(),
        vec!["Scraped 2 new events for princeton."]
    );
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_at_batch_boundary() {
    let transport = Arc::new(
        StubTransport::default()
            .page(BASE, 1, listing(&[card("A", "Jun 1", "/e/a")]))
            .page(BASE, 2, listing(&[card("B", "Jun 2", "/e/b")])),
    );
    let store = Arc::new(MemoryEventStore::new());
    let shutdown = Arc::new(AtomicBool::new(false));
    let scheduler = scheduler(transport.clone(), store).with_shutdown(shutdown.clone());

    // Flip the flag while the scheduler sleeps between batches
    let flag = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(PAGE_LATENCY + Duration::from_secs(5)).await;
        flag.store(true, Ordering::SeqCst);
    });

    let report = scheduler
        .run_source(&SourceSpec::new(BASE, "princeton", 2, 1))
        .await;

    assert!(report.cancelled);
    assert_eq!(report.pages_attempted(), 1);
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn cached_pages_skip_the_network_within_ttl() {
    let transport = Arc::new(
        StubTransport::default().page(BASE, 1, listing(&[card("A", "Jun 1", "/e/a")])),
    );
    let cache = Arc::new(MemoryPageCache::new());
    let ttl = Duration::from_secs(3 * 60 * 60);
    let fetcher = Fetcher::new(transport.clone()).with_cache(cache, ttl);
    let store = Arc::new(MemoryEventStore::new());
    let scheduler = BatchScheduler::new(fetcher, extractor(), store.clone(), INTER_BATCH);
    let source = SourceSpec::new(BASE, "princeton", 1, 1);

    let first = scheduler.run_source(&source).await;
    let second = scheduler.run_source(&source).await;
    assert_eq!(transport.calls().len(), 1);

    // Second run has a fresh SeenSet; the stored event makes it non-novel
    assert_eq!(first.records_novel(), 1);
    assert_eq!(second.records_found(), 1);
    assert_eq!(second.records_novel(), 0);

    tokio::time::advance(ttl).await;
    scheduler.run_source(&source).await;
    assert_eq!(transport.calls().len(), 2);
    assert_eq!(store.recent("princeton", 10).await.unwrap().len(), 1);
}
