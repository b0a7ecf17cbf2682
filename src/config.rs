//! Configuration management for eventscrape using the prefer crate.
//!
//! `Config` is the file as written (every field optional); `Settings` is the
//! resolved view the commands work with, after defaults and environment
//! overrides are applied.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::repository::DbContext;
use crate::scrapers::config::default_sources;
use crate::scrapers::{ExtractorConfig, ScrapeConfig, SourceConfig, SourceSpec};

/// Default database filename.
const DEFAULT_DATABASE_FILENAME: &str = "eventscrape.db";

/// Slack credentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlackConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

impl SlackConfig {
    /// Apply SLACK_BOT_TOKEN / SLACK_CHANNEL_ID overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(token) = env_var("SLACK_BOT_TOKEN") {
            self.bot_token = Some(token);
        }
        if let Some(channel) = env_var("SLACK_CHANNEL_ID") {
            self.channel_id = Some(channel);
        }
        self
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Database URL or file path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// User agent configuration.
    /// - None / "impersonate": random real browser user agent per request
    /// - Any other string: used as-is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub scrape: ScrapeConfig,
    /// Listing sources. Empty means the built-in defaults.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceConfig>,
    #[serde(default, skip_serializing_if = "ExtractorConfig::is_default")]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub slack: SlackConfig,
    /// Path the config was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers eventscrape config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("eventscrape").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("{}", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    /// Returns the config file's parent directory if available, otherwise None.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Apply configuration to settings.
    /// `base_dir` is used to resolve a relative `data_dir`.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            let path = Path::new(data_dir);
            settings.data_dir = if path.is_absolute() {
                path.to_path_buf()
            } else {
                base_dir.join(path)
            };
        }
        if let Some(ref database) = self.database {
            settings.database_url = Some(database.clone());
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(timeout) = self.request_timeout_secs {
            settings.request_timeout = timeout;
        }
        settings.scrape = self.scrape.clone();
        if !self.sources.is_empty() {
            settings.sources = self.sources.clone();
        }
        settings.extractor = self.extractor.clone();
        settings.slack = self.slack.clone();
    }
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database URL (overrides data_dir/eventscrape.db if set).
    pub database_url: Option<String>,
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    pub scrape: ScrapeConfig,
    pub sources: Vec<SourceConfig>,
    pub extractor: ExtractorConfig,
    pub slack: SlackConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            database_url: None,
            user_agent: Some("impersonate".to_string()),
            request_timeout: 30,
            scrape: ScrapeConfig::default(),
            sources: default_sources(),
            extractor: ExtractorConfig::default(),
            slack: SlackConfig::default(),
        }
    }
}

impl Settings {
    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        match self.database_url {
            Some(ref url) => url.clone(),
            None => format!("sqlite:{}", self.database_path().display()),
        }
    }

    /// Default database location inside the data directory.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DEFAULT_DATABASE_FILENAME)
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create data directory '{}': {}",
                    self.data_dir.display(),
                    e
                ),
            )
        })
    }

    pub fn create_db_context(&self) -> DbContext {
        DbContext::from_url(&self.database_url())
    }

    /// Resolved sources, with scrape defaults filled in.
    pub fn source_specs(&self) -> Vec<SourceSpec> {
        self.sources
            .iter()
            .map(|source| {
                SourceSpec::new(
                    &source.base_url,
                    &source.collection_key(),
                    source.max_pages.unwrap_or(self.scrape.max_pages),
                    source.batch_size.unwrap_or(self.scrape.batch_size),
                )
            })
            .collect()
    }

    /// Apply environment overrides (DATABASE_URL, SLACK_*).
    fn apply_env(&mut self) {
        if let Some(url) = env_var("DATABASE_URL") {
            self.database_url = Some(url);
        }
        self.slack = std::mem::take(&mut self.slack).with_env_overrides();
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
}

/// Load settings: explicit config file, else discovered config, else defaults.
/// Environment variables win over file values.
pub async fn load_settings_with_options(options: LoadOptions) -> Result<(Settings, Config), String> {
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    let base_dir = config
        .base_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);
    settings.apply_env();

    if let Some(ref path) = config.source_path {
        tracing::debug!("Loaded config from {}", path.display());
    }

    Ok((settings, config))
}
