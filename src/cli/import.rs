use anyhow::{Context, Result};
use std::path::Path;

use nomadish::cache::decode_blob;
use nomadish::config::NomadishConfig;

/// Import memories from a JSON array file (the `export` format).
///
/// Undecodable entries and ids already in the cache are skipped. Imported
/// records keep their sync status; nothing is sent to the server.
pub async fn import(config: &NomadishConfig, file: &Path) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read import file: {}", file.display()))?;

    let contents = decode_blob(&json);
    anyhow::ensure!(
        contents.well_formed,
        "import file is not a JSON array of memories: {}",
        file.display()
    );

    println!("Importing {} memories...", contents.total_entries);

    let coordinator = super::open_coordinator(config).await?;
    let decoded = contents.records.len();
    let imported = coordinator.merge_local(contents.records).await?;

    println!("Import complete:");
    println!("  Memories imported: {imported}");
    println!("  Memories skipped:  {} (already exist)", decoded - imported);
    if contents.skipped > 0 {
        println!("  Invalid entries:   {}", contents.skipped);
    }

    Ok(())
}
