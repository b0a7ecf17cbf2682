//! Cache-aware page fetching.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::debug;

use super::cache::PageCache;
use super::error::FetchError;
use super::http_client::PageTransport;

/// Desktop browser identities the listing site serves full pages to.
pub const BROWSER_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Firefox/89.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
];

/// How outbound requests identify themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UserAgentPolicy {
    /// A browser identity drawn independently for every request.
    #[default]
    Rotate,
    /// The same string on every request.
    Fixed(String),
}

impl UserAgentPolicy {
    /// Map the `user_agent` setting: unset, empty or `impersonate` rotate,
    /// anything else is sent verbatim.
    pub fn from_setting(setting: Option<&str>) -> Self {
        match setting.map(str::trim) {
            None | Some("") => Self::Rotate,
            Some(s) if s.eq_ignore_ascii_case("impersonate") => Self::Rotate,
            Some(s) => Self::Fixed(s.to_string()),
        }
    }

    /// The header value for the next request.
    pub fn pick(&self) -> &str {
        match self {
            Self::Rotate => {
                BROWSER_USER_AGENTS[rand::rng().random_range(0..BROWSER_USER_AGENTS.len())]
            }
            Self::Fixed(s) => s,
        }
    }
}

/// Fetches listing pages, consulting the page cache before the network.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn PageTransport>,
    cache: Option<Arc<dyn PageCache>>,
    ttl: Duration,
    user_agent: UserAgentPolicy,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn PageTransport>) -> Self {
        Self {
            transport,
            cache: None,
            ttl: Duration::ZERO,
            user_agent: UserAgentPolicy::default(),
        }
    }

    /// Store successful responses in `cache` for `ttl`.
    pub fn with_cache(mut self, cache: Arc<dyn PageCache>, ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.ttl = ttl;
        self
    }

    pub fn with_user_agent(mut self, user_agent: UserAgentPolicy) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Return the page body, from cache when a live entry exists.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(url).await {
                debug!("Cache hit for {}", url);
                return Ok(hit.body);
            }
        }

        let body = self.transport.get_text(url, self.user_agent.pick()).await?;

        if let Some(cache) = &self.cache {
            cache.put(url, &body, self.ttl).await;
        }

        Ok(body)
    }
}
