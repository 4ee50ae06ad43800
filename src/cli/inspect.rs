//! CLI `list` and `show` commands: read the cache, never the server.

use anyhow::{bail, Result};

use nomadish::config::NomadishConfig;
use nomadish::memory::codec::format_date;

/// List every cached memory, one per line.
pub async fn list(config: &NomadishConfig) -> Result<()> {
    let coordinator = super::open_coordinator(config).await?;
    let records = coordinator.records();

    if records.is_empty() {
        println!("No memories cached. Run `nomadish refresh` to fetch from the server.");
        return Ok(());
    }

    for record in &records {
        println!("{}", super::summary_line(record));
    }
    println!();
    println!("{} memories ({} local only)", records.len(), coordinator.pending().len());
    Ok(())
}

/// Display full details for a single memory.
pub async fn show(config: &NomadishConfig, id: &str) -> Result<()> {
    let coordinator = super::open_coordinator(config).await?;
    let Some(m) = coordinator.get(id) else {
        bail!("memory not found in cache: {id}");
    };

    println!("Memory: {}", m.id);
    println!("{}", "=".repeat(50));
    println!("  Name:           {}", m.name);
    println!("  Rating:         {}", m.rating);
    println!("  Added:          {}", format_date(&m.date_added));
    println!(
        "  Location:       {:.5}, {:.5}",
        m.coordinate.latitude, m.coordinate.longitude
    );
    println!("  Status:         {}", m.sync_status);
    if let Some(url) = m.image_url() {
        println!("  Photo:          {url}");
    }
    if !m.notes.is_empty() {
        println!();
        println!("Notes:");
        println!("  {}", m.notes);
    }

    Ok(())
}
