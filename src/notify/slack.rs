use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::Notifier;

const POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// Upper bound on one notification, connect through body.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Slack Web API response envelope.
#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Posts messages to a channel with a bot token.
pub struct SlackNotifier {
    bot_token: Option<String>,
    channel_id: Option<String>,
    endpoint: String,
    /// None when the client could not be built; notifications are then dropped.
    http: Option<reqwest::Client>,
}

impl SlackNotifier {
    pub fn new(bot_token: Option<String>, channel_id: Option<String>) -> Self {
        Self::with_endpoint(bot_token, channel_id, POST_MESSAGE_URL, SEND_TIMEOUT)
    }

    fn with_endpoint(
        bot_token: Option<String>,
        channel_id: Option<String>,
        endpoint: &str,
        timeout: Duration,
    ) -> Self {
        let http = match reqwest::Client::builder().timeout(timeout).build() {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(error = %e, "Failed to build Slack HTTP client");
                None
            }
        };
        Self {
            bot_token: bot_token.filter(|s| !s.is_empty()),
            channel_id: channel_id.filter(|s| !s.is_empty()),
            endpoint: endpoint.to_string(),
            http,
        }
    }

    /// A token, a channel and a working client are required to send anything.
    pub fn is_configured(&self) -> bool {
        self.bot_token.is_some() && self.channel_id.is_some() && self.http.is_some()
    }

    async fn post(
        &self,
        http: &reqwest::Client,
        token: &str,
        channel: &str,
        text: &str,
    ) -> anyhow::Result<()> {
        let resp = http
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&json!({
                "channel": channel,
                "text": text,
                "unfurl_links": false,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            anyhow::bail!("Slack returned {status}");
        }

        let body: SlackResponse = resp.json().await?;
        if !body.ok {
            anyhow::bail!(
                "Slack API error: {}",
                body.error.as_deref().unwrap_or("unknown")
            );
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, text: &str) -> bool {
        let (Some(http), Some(token), Some(channel)) =
            (&self.http, &self.bot_token, &self.channel_id)
        else {
            debug!("Slack not configured, dropping notification");
            return false;
        };

        match self.post(http, token, channel, text).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to send Slack notification");
                false
            }
        }
    }
}
