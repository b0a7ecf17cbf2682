//! Initialize command.

use console::style;

use crate::config::Settings;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    println!(
        "{} Initialized eventscrape database at {}",
        style("✓").green(),
        settings.database_url()
    );
    println!(
        "  {} source(s) configured, run 'eventscrape sources' to list them",
        settings.sources.len()
    );

    Ok(())
}
