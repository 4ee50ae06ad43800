use anyhow::Result;

use nomadish::cache::{self, encode_blob};
use nomadish::config::NomadishConfig;

/// Export all cached memories as a JSON array to stdout.
pub fn export(config: &NomadishConfig) -> Result<()> {
    let store = cache::open_cache_store(&config.storage)?;
    let records = store.load()?;

    let json = encode_blob(&records)?;
    println!("{json}");

    eprintln!("Exported {} memories.", records.len());

    Ok(())
}
