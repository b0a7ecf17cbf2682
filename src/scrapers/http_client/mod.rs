//! HTTP transport for listing pages.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header;
use reqwest::Client;
use tracing::debug;

use super::error::{FetchError, FetchErrorKind};

/// Issues one outbound GET per call. Implemented by [`HttpClient`] and by
/// test doubles.
#[async_trait]
pub trait PageTransport: Send + Sync {
    async fn get_text(&self, url: &str, user_agent: &str) -> Result<String, FetchError>;
}

/// reqwest-backed transport.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageTransport for HttpClient {
    async fn get_text(&self, url: &str, user_agent: &str) -> Result<String, FetchError> {
        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .header(header::USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, &e))?;

        let status = response.status();
        debug!(
            "GET {} -> {} in {}ms",
            url,
            status.as_u16(),
            start.elapsed().as_millis()
        );

        if !status.is_success() {
            return Err(FetchError::new(
                url,
                FetchErrorKind::Status(status.as_u16()),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::new(url, FetchErrorKind::Body(e.to_string())))
    }
}
