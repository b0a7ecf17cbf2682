//! Listing page extraction.
//!
//! Turns one page of HTML into candidate events. Each card is read
//! independently: a card that fails to parse is counted and skipped, and
//! cards whose title falls back to the sentinel are dropped before they
//! reach deduplication.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::config::ExtractorConfig;
use super::error::{ExtractorConfigError, ParseError};
use crate::models::{CandidateEvent, SENTINEL};

/// Result of extracting one page.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Candidates in document order, sentinel titles excluded.
    pub events: Vec<CandidateEvent>,
    /// Cards skipped because they could not be parsed.
    pub failures: Vec<ParseError>,
    /// Cards dropped because no title could be resolved.
    pub discarded: usize,
}

/// Compiled extraction rules.
pub struct EventExtractor {
    card: Selector,
    titles: Vec<Selector>,
    dates: Vec<Regex>,
    link: Selector,
    location_attribute: String,
    base: Url,
}

fn compile_selector(selector: &str) -> Result<Selector, ExtractorConfigError> {
    Selector::parse(selector).map_err(|e| ExtractorConfigError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Visible text of an element with whitespace runs collapsed.
fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

impl EventExtractor {
    pub fn from_config(config: &ExtractorConfig) -> Result<Self, ExtractorConfigError> {
        let titles = config
            .title_selectors
            .iter()
            .map(|s| compile_selector(s))
            .collect::<Result<Vec<_>, _>>()?;

        let dates = config
            .date_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| ExtractorConfigError::Pattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let base = Url::parse(&config.base_url).map_err(|e| ExtractorConfigError::BaseUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            card: compile_selector(&config.card_selector)?,
            titles,
            dates,
            link: compile_selector(&config.link_selector)?,
            location_attribute: config.location_attribute.clone(),
            base,
        })
    }

    /// Extract every card on the page.
    pub fn extract(&self, body: &str) -> Extraction {
        let document = Html::parse_document(body);
        let mut extraction = Extraction::default();

        for card in document.select(&self.card) {
            match self.read_card(&card) {
                Ok(candidate) if candidate.has_sentinel_title() => extraction.discarded += 1,
                Ok(candidate) => extraction.events.push(candidate),
                Err(e) => extraction.failures.push(e),
            }
        }

        extraction
    }

    fn read_card(&self, card: &ElementRef<'_>) -> Result<CandidateEvent, ParseError> {
        let title = self.title(card).unwrap_or_else(|| SENTINEL.to_string());
        let date = self.date(card).unwrap_or_else(|| SENTINEL.to_string());

        let (location, url) = match card.select(&self.link).next() {
            Some(link) => {
                let location = link
                    .value()
                    .attr(&self.location_attribute)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .unwrap_or(SENTINEL)
                    .to_string();
                let href = link
                    .value()
                    .attr("href")
                    .ok_or(ParseError::MissingElement("link href"))?;
                (location, self.absolute_url(href)?)
            }
            None => (SENTINEL.to_string(), String::new()),
        };

        Ok(CandidateEvent {
            title,
            date,
            location,
            url,
        })
    }

    /// First non-empty heading among the ordered title selectors.
    fn title(&self, card: &ElementRef<'_>) -> Option<String> {
        self.titles.iter().find_map(|selector| {
            card.select(selector)
                .map(|el| element_text(&el))
                .find(|text| !text.is_empty())
        })
    }

    /// First date pattern that matches the card text.
    fn date(&self, card: &ElementRef<'_>) -> Option<String> {
        let text = element_text(card);
        self.dates
            .iter()
            .find_map(|re| re.find(&text).map(|m| m.as_str().to_string()))
    }

    fn absolute_url(&self, href: &str) -> Result<String, ParseError> {
        self.base
            .join(href.trim())
            .map(|u| u.to_string())
            .map_err(|e| ParseError::InvalidUrl {
                href: href.to_string(),
                reason: e.to_string(),
            })
    }
}
