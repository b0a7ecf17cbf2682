//! Recent events command.

use console::style;

use crate::config::Settings;
use crate::models::{Event, SENTINEL};
use crate::repository::{EventStore, StoreResult};

const DEFAULT_LIMIT: usize = 5;
const MAX_LIMIT: usize = 50;

/// What an `events` query covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionQuery {
    /// Every configured collection, merged.
    All,
    Collection(String),
}

/// Map a user-supplied region to a query.
///
/// Known aliases map to their collection key; any configured collection key
/// is accepted as-is. Returns `None` for anything else.
pub fn resolve_region(region: &str, known: &[String]) -> Option<RegionQuery> {
    let region = region.trim().to_lowercase();
    let key = match region.as_str() {
        "nj" | "all" => return Some(RegionQuery::All),
        "newbrunswick" | "new-brunswick" => "new-brunswick",
        "jerseycity" | "jersey-city" => "jersey-city",
        "princeton" => "princeton",
        "newark" => "newark",
        "camden" => "camden",
        other if known.iter().any(|k| k == other) => other,
        _ => return None,
    };
    Some(RegionQuery::Collection(key.to_string()))
}

/// Parse the limit argument: default 5, clamped to 1..=50, garbage => default.
pub fn parse_limit(arg: Option<&str>) -> usize {
    arg.and_then(|s| s.trim().parse::<i64>().ok())
        .map(|n| n.clamp(1, MAX_LIMIT as i64) as usize)
        .unwrap_or(DEFAULT_LIMIT)
}

/// Load recent events for the query, newest first.
pub async fn recent_events(
    store: &dyn EventStore,
    query: &RegionQuery,
    collections: &[String],
    limit: usize,
) -> StoreResult<Vec<Event>> {
    match query {
        RegionQuery::Collection(key) => store.recent(key, limit).await,
        RegionQuery::All => {
            let mut merged = Vec::new();
            for collection in collections {
                merged.extend(store.recent(collection, limit).await?);
            }
            merged.sort_by(|a, b| b.scraped_at.cmp(&a.scraped_at));
            merged.truncate(limit);
            Ok(merged)
        }
    }
}

/// One bullet per event; an unknown location is left out rather than printed.
pub fn format_events(events: &[Event]) -> String {
    events
        .iter()
        .map(|e| {
            let location = if e.location.is_empty() || e.location == SENTINEL {
                String::new()
            } else {
                format!(" — {}", e.location)
            };
            format!("• {} — {}{}\n{}", e.title, e.date, location, e.url)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn empty_message(region: &str, query: &RegionQuery) -> String {
    match query {
        RegionQuery::All => "No recent events found across NJ collections.".to_string(),
        RegionQuery::Collection(_) => format!("No recent events found for '{}'.", region),
    }
}

/// Show the most recently scraped events for a region.
pub async fn cmd_events(settings: &Settings, region: &str, limit: Option<&str>) -> anyhow::Result<()> {
    let mut collections: Vec<String> = Vec::new();
    for spec in settings.source_specs() {
        if !collections.contains(&spec.collection) {
            collections.push(spec.collection);
        }
    }

    let Some(query) = resolve_region(region, &collections) else {
        println!(
            "{} Unknown region '{}'. Try one of: nj, {}",
            style("!").yellow(),
            region,
            collections.join(", ")
        );
        return Ok(());
    };
    let limit = parse_limit(limit);

    let ctx = settings.create_db_context();
    ctx.init_schema().await?;
    let store = ctx.events();

    let events = recent_events(&store, &query, &collections, limit).await?;
    if events.is_empty() {
        println!("{}", empty_message(region, &query));
    } else {
        println!("{}", format_events(&events));
    }

    Ok(())
}
