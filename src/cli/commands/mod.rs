//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod events;
mod helpers;
mod init;
mod scrape;
mod sources;

use std::path::PathBuf;

use anyhow::anyhow;
use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "eventscrape")]
#[command(about = "Scrape paginated event listings into a deduplicated store")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Scrape configured listing sources
    Scrape {
        /// Collections to scrape (default: all configured sources)
        collections: Vec<String>,
        /// Override the number of pages per source
        #[arg(long)]
        max_pages: Option<u32>,
        /// Override the number of pages fetched concurrently
        #[arg(long)]
        batch_size: Option<usize>,
        /// Always fetch from the network
        #[arg(long)]
        no_cache: bool,
        /// Do not send notifications
        #[arg(long)]
        no_notify: bool,
        /// Scrape into memory only; nothing is written or sent
        #[arg(long)]
        dry_run: bool,
    },

    /// Show recently scraped events
    Events {
        /// Region or collection (e.g. princeton, jersey-city, nj)
        #[arg(default_value = "nj")]
        region: String,
        /// Number of events to show (1-50)
        limit: Option<String>,
    },

    /// List configured sources
    Sources,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
    };
    let (settings, _config) = load_settings_with_options(options)
        .await
        .map_err(|e| anyhow!(e))?;

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Scrape {
            collections,
            max_pages,
            batch_size,
            no_cache,
            no_notify,
            dry_run,
        } => {
            let options = scrape::ScrapeOptions {
                collections,
                max_pages,
                batch_size,
                no_cache,
                no_notify,
                dry_run,
            };
            scrape::cmd_scrape(&settings, options).await
        }
        Commands::Events { region, limit } => {
            events::cmd_events(&settings, &region, limit.as_deref()).await
        }
        Commands::Sources => sources::cmd_sources(&settings).await,
    }
}
