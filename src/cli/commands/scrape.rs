//! Scrape command.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use console::style;

use crate::config::Settings;
use crate::notify::{NoopNotifier, Notifier, SlackNotifier};
use crate::repository::{EventStore, MemoryEventStore};
use crate::scrapers::{
    BatchScheduler, CacheBackend, EventExtractor, Fetcher, HttpClient, MemoryPageCache, PageCache,
    SourceSpec, UserAgentPolicy,
};
use crate::services::{RunReport, ScrapeService};

use super::helpers::truncate;

/// Command-line overrides for a scrape run.
#[derive(Debug, Clone, Default)]
pub struct ScrapeOptions {
    pub collections: Vec<String>,
    pub max_pages: Option<u32>,
    pub batch_size: Option<usize>,
    pub no_cache: bool,
    pub no_notify: bool,
    pub dry_run: bool,
}

/// Pick the sources to run and apply overrides.
fn select_sources(settings: &Settings, options: &ScrapeOptions) -> anyhow::Result<Vec<SourceSpec>> {
    let all = settings.source_specs();

    let mut selected: Vec<SourceSpec> = if options.collections.is_empty() {
        all
    } else {
        let mut picked = Vec::new();
        for name in &options.collections {
            match all.iter().find(|s| &s.collection == name) {
                Some(spec) => picked.push(spec.clone()),
                None => {
                    let known: Vec<&str> = all.iter().map(|s| s.collection.as_str()).collect();
                    bail!("Unknown collection '{}'. Configured: {}", name, known.join(", "));
                }
            }
        }
        picked
    };

    for spec in &mut selected {
        if let Some(max_pages) = options.max_pages {
            spec.max_pages = max_pages;
        }
        if let Some(batch_size) = options.batch_size {
            spec.batch_size = batch_size;
        }
    }

    Ok(selected)
}

/// Scrape configured sources.
pub async fn cmd_scrape(settings: &Settings, options: ScrapeOptions) -> anyhow::Result<()> {
    let sources = select_sources(settings, &options)?;
    if sources.is_empty() {
        println!("{} No sources to scrape.", style("!").yellow());
        return Ok(());
    }

    let extractor = EventExtractor::from_config(&settings.extractor)
        .context("Invalid extractor configuration")?;

    let (store, cache): (Arc<dyn EventStore>, Arc<dyn PageCache>) = if options.dry_run {
        println!("{} Dry run: nothing will be saved", style("!").yellow());
        let store: Arc<dyn EventStore> = Arc::new(MemoryEventStore::new());
        let cache: Arc<dyn PageCache> = Arc::new(MemoryPageCache::new());
        (store, cache)
    } else {
        settings.ensure_directories()?;
        let ctx = settings.create_db_context();
        ctx.init_schema()
            .await
            .with_context(|| format!("Failed to open database {}", settings.database_url()))?;

        let cache: Arc<dyn PageCache> = match settings.scrape.cache {
            CacheBackend::Memory => Arc::new(MemoryPageCache::new()),
            CacheBackend::Database => {
                let cache = ctx.page_cache();
                let purged = cache.purge_expired().await;
                if purged > 0 {
                    tracing::debug!("Purged {} expired cached pages", purged);
                }
                Arc::new(cache)
            }
        };
        let store: Arc<dyn EventStore> = Arc::new(ctx.events());
        (store, cache)
    };
    let cache = if options.no_cache { None } else { Some(cache) };

    let transport = HttpClient::new(Duration::from_secs(settings.request_timeout))
        .context("Failed to build HTTP client")?;
    let mut fetcher = Fetcher::new(Arc::new(transport))
        .with_user_agent(UserAgentPolicy::from_setting(settings.user_agent.as_deref()));
    if let Some(cache) = cache {
        fetcher = fetcher.with_cache(cache, settings.scrape.cache_ttl());
    }

    let notifier: Arc<dyn Notifier> = if options.no_notify || options.dry_run {
        Arc::new(NoopNotifier)
    } else {
        let slack = SlackNotifier::new(
            settings.slack.bot_token.clone(),
            settings.slack.channel_id.clone(),
        );
        if !slack.is_configured() {
            println!(
                "{} Slack not configured (SLACK_BOT_TOKEN / SLACK_CHANNEL_ID), notifications disabled",
                style("!").yellow()
            );
        }
        Arc::new(slack)
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!(
                    "\n{} Stopping after the current batch...",
                    style("!").yellow()
                );
                shutdown.store(true, Ordering::SeqCst);
            }
        });
    }

    let scheduler = BatchScheduler::new(
        fetcher,
        extractor,
        store,
        settings.scrape.inter_batch_delay(),
    );
    let service = ScrapeService::new(
        scheduler,
        notifier,
        settings.scrape.inter_source_delay(),
        shutdown,
    );

    println!(
        "{} Scraping {} source(s)",
        style("→").cyan(),
        sources.len()
    );
    let report = service.run(&sources).await;
    print_report(&report);

    Ok(())
}

fn print_report(report: &RunReport) {
    println!("\n{}", style("Scrape Summary").bold());
    println!("{}", "-".repeat(72));
    println!(
        "{:<16} {:>6} {:>7} {:>6} {:>6} {:>8} {:>8}",
        "Collection", "Pages", "Found", "Novel", "Saved", "Fetch!", "Parse!"
    );
    println!("{}", "-".repeat(72));

    for source in &report.sources {
        println!(
            "{:<16} {:>6} {:>7} {:>6} {:>6} {:>8} {:>8}",
            truncate(&source.collection, 16),
            source.pages_attempted(),
            source.records_found(),
            source.records_novel(),
            source.inserted(),
            source.fetch_failures(),
            source.parse_failures()
        );
        if source.lookup_failures() > 0 {
            println!(
                "  {} {} candidates skipped after failed store lookups",
                style("!").yellow(),
                source.lookup_failures()
            );
        }
        if let Some(error) = source.persist_error() {
            println!(
                "  {} Failed to save {} events: {}",
                style("✗").red(),
                source.persist_failures(),
                error
            );
        }
    }

    if report.cancelled {
        println!("{} Run cancelled", style("!").yellow());
    } else {
        println!(
            "{} {} new events, {} fetch failures",
            style("✓").green(),
            report.records_novel(),
            report.fetch_failures()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_sources_filters_and_overrides() {
        let settings = Settings::default();
        let options = ScrapeOptions {
            collections: vec!["newark".to_string(), "princeton".to_string()],
            max_pages: Some(3),
            batch_size: Some(2),
            ..Default::default()
        };

        let selected = select_sources(&settings, &options).unwrap();
        let names: Vec<&str> = selected.iter().map(|s| s.collection.as_str()).collect();
        assert_eq!(names, vec!["newark", "princeton"]);
        assert!(selected.iter().all(|s| s.max_pages == 3 && s.batch_size == 2));
    }

    #[test]
    fn test_select_unknown_collection() {
        let options = ScrapeOptions {
            collections: vec!["trenton".to_string()],
            ..Default::default()
        };
        assert!(select_sources(&Settings::default(), &options).is_err());
    }
}
