//! Scraper configuration types.
//!
//! These structs define the configurable behavior of the listing pipeline:
//! how cards are found and read, and how pages are batched and paced.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Listing card extraction rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// CSS selector matching one listing card.
    #[serde(default = "default_card_selector")]
    pub card_selector: String,
    /// Heading selectors tried in order; the first non-empty match is the title.
    #[serde(default = "default_title_selectors")]
    pub title_selectors: Vec<String>,
    /// Date regexes tried in order against the card text.
    #[serde(default = "default_date_patterns")]
    pub date_patterns: Vec<String>,
    /// Selector for the link element inside a card.
    #[serde(default = "default_link_selector")]
    pub link_selector: String,
    /// Attribute on the link element holding the venue/location.
    #[serde(default = "default_location_attribute")]
    pub location_attribute: String,
    /// Prefix used to make relative event links absolute.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_card_selector() -> String {
    r#"[data-testid="event-card"], .event-card"#.to_string()
}

fn default_title_selectors() -> Vec<String> {
    vec!["h3".to_string(), "h2".to_string(), "h4".to_string()]
}

fn default_date_patterns() -> Vec<String> {
    vec![
        r"[A-Za-z]{3}, [A-Za-z]{3} \d{1,2}, \d{1,2}:\d{2} [AP]M".to_string(),
        r"[A-Za-z]{3} \d{1,2}, \d{4}".to_string(),
        r"[A-Za-z]{3} \d{1,2}".to_string(),
    ]
}

fn default_link_selector() -> String {
    "a[href]".to_string()
}

fn default_location_attribute() -> String {
    "data-event-location".to_string()
}

fn default_base_url() -> String {
    "https://www.eventbrite.com".to_string()
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            card_selector: default_card_selector(),
            title_selectors: default_title_selectors(),
            date_patterns: default_date_patterns(),
            link_selector: default_link_selector(),
            location_attribute: default_location_attribute(),
            base_url: default_base_url(),
        }
    }
}

impl ExtractorConfig {
    /// Check if this is the default config.
    pub fn is_default(&self) -> bool {
        self == &Self::default()
    }
}

/// Which page cache backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Process-local, lost on exit.
    Memory,
    /// `page_cache` table in the event database.
    #[default]
    Database,
}

/// Batching, pacing and caching knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Pause between batches of the same source.
    #[serde(default = "default_inter_batch_delay_secs")]
    pub inter_batch_delay_secs: u64,
    /// Pause between consecutive sources.
    #[serde(default = "default_inter_source_delay_secs")]
    pub inter_source_delay_secs: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default)]
    pub cache: CacheBackend,
}

fn default_batch_size() -> usize {
    10
}

fn default_max_pages() -> u32 {
    100
}

fn default_inter_batch_delay_secs() -> u64 {
    20
}

fn default_inter_source_delay_secs() -> u64 {
    2900
}

fn default_cache_ttl_secs() -> u64 {
    3 * 60 * 60
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_pages: default_max_pages(),
            inter_batch_delay_secs: default_inter_batch_delay_secs(),
            inter_source_delay_secs: default_inter_source_delay_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache: CacheBackend::default(),
        }
    }
}

impl ScrapeConfig {
    pub fn inter_batch_delay(&self) -> Duration {
        Duration::from_secs(self.inter_batch_delay_secs)
    }

    pub fn inter_source_delay(&self) -> Duration {
        Duration::from_secs(self.inter_source_delay_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// One listing source as written in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub base_url: String,
    /// Collection key; derived from the URL when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
}

impl SourceConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            collection: None,
            max_pages: None,
            batch_size: None,
        }
    }

    /// Effective collection key.
    pub fn collection_key(&self) -> String {
        self.collection
            .clone()
            .unwrap_or_else(|| collection_from_url(&self.base_url))
    }
}

/// Derive a collection key from a listing URL's location slug.
///
/// `https://www.eventbrite.com/d/nj--princeton/all-events/` => `princeton`.
/// Falls back to the last non-empty path segment when there is no `--`.
pub fn collection_from_url(url: &str) -> String {
    if let Some((_, rest)) = url.split_once("--") {
        if let Some(slug) = rest.split('/').next().filter(|s| !s.is_empty()) {
            return slug.to_string();
        }
    }
    url.trim_end_matches('/')
        .rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or("default")
        .to_string()
}

/// The NJ listing pages scraped when no sources are configured.
pub fn default_sources() -> Vec<SourceConfig> {
    [
        "https://www.eventbrite.com/d/nj--new-brunswick/all-events/",
        "https://www.eventbrite.com/d/nj--princeton/all-events/",
        "https://www.eventbrite.com/d/nj--jersey-city/all-events/",
        "https://www.eventbrite.com/d/nj--newark/all-events/",
        "https://www.eventbrite.com/d/nj--camden/all-events/",
    ]
    .iter()
    .map(|url| SourceConfig::new(url))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_from_url() {
        assert_eq!(
            collection_from_url("https://www.eventbrite.com/d/nj--princeton/all-events/"),
            "princeton"
        );
        assert_eq!(
            collection_from_url("https://www.eventbrite.com/d/nj--new-brunswick/all-events/"),
            "new-brunswick"
        );
        assert_eq!(collection_from_url("https://example.com/events/"), "events");
    }

    #[test]
    fn test_explicit_collection_wins() {
        let mut source = SourceConfig::new("https://www.eventbrite.com/d/nj--newark/all-events/");
        assert_eq!(source.collection_key(), "newark");
        source.collection = Some("north-jersey".to_string());
        assert_eq!(source.collection_key(), "north-jersey");
    }

    #[test]
    fn test_default_sources() {
        let keys: Vec<String> = default_sources().iter().map(|s| s.collection_key()).collect();
        assert_eq!(
            keys,
            vec!["new-brunswick", "princeton", "jersey-city", "newark", "camden"]
        );
    }

    #[test]
    fn test_partial_extractor_config() {
        let config: ExtractorConfig = toml::from_str(r#"title_selectors = ["h1"]"#).unwrap();
        assert_eq!(config.title_selectors, vec!["h1"]);
        assert_eq!(config.link_selector, "a[href]");
        assert_eq!(config.date_patterns.len(), 3);
    }

    #[test]
    fn test_scrape_config_defaults() {
        let config: ScrapeConfig = toml::from_str("cache = \"memory\"").unwrap();
        assert_eq!(config.cache, CacheBackend::Memory);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.max_pages, 100);
        assert_eq!(config.inter_batch_delay(), Duration::from_secs(20));
        assert_eq!(config.inter_source_delay(), Duration::from_secs(2900));
        assert_eq!(config.cache_ttl(), Duration::from_secs(10800));
    }
}
