//! Source listing command.

use console::style;

use crate::config::Settings;

use super::helpers::truncate;

/// List configured sources with their collection keys.
pub async fn cmd_sources(settings: &Settings) -> anyhow::Result<()> {
    let specs = settings.source_specs();

    if specs.is_empty() {
        println!("{} No sources configured.", style("!").yellow());
        return Ok(());
    }

    println!("\n{}", style("Listing Sources").bold());
    println!("{}", "-".repeat(80));
    println!("{:<16} {:>6} {:>6}  URL", "Collection", "Pages", "Batch");
    println!("{}", "-".repeat(80));

    for spec in specs {
        println!(
            "{:<16} {:>6} {:>6}  {}",
            truncate(&spec.collection, 16),
            spec.max_pages,
            spec.batch_size,
            spec.base_url
        );
    }

    Ok(())
}
