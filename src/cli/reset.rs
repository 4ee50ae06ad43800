//! CLI `reset` command: delete the cache after user confirmation.

use anyhow::{bail, Result};
use std::io::Write;

use nomadish::cache;
use nomadish::config::NomadishConfig;

/// Delete all cached memories after user confirmation. The server is not touched.
pub fn reset(config: &NomadishConfig) -> Result<()> {
    let store = cache::open_cache_store(&config.storage)?;

    println!("WARNING: This will permanently delete ALL cached memories, including local-only ones.");
    println!("Cache: {}", store.location());
    print!("\nType YES to confirm: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    if input.trim() != "YES" {
        bail!("reset cancelled");
    }

    store.clear()?;

    println!("Cache cleared. Run `nomadish refresh` to fetch memories from the server.");
    Ok(())
}
