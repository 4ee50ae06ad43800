//! CLI `doctor` command: inspect the cache and print a health report.

use anyhow::{Context, Result};

use nomadish::cache::{self, check_cache_health};
use nomadish::config::{expand_tilde, NomadishConfig};
use nomadish::db;

/// Run cache diagnostics and print a health report.
pub fn doctor(config: &NomadishConfig) -> Result<()> {
    let store = cache::open_cache_store(&config.storage)?;
    let report = check_cache_health(store.as_ref()).context("failed to read cache")?;

    println!("Nomadish Health Report");
    println!("======================");
    println!();
    println!("Backend:           {}", config.storage.backend);
    println!("Cache:             {}", report.location);
    println!("Server:            {}", config.server.base_url);
    println!();

    if !report.exists {
        println!("Cache blob:        not found");
        println!("Run `nomadish refresh` to fetch memories from the server.");
        return Ok(());
    }

    println!("Blob size:         {}", format_bytes(report.blob_bytes as u64));
    println!("Entries:           {}", report.total_entries);
    println!("  Decodable:       {}", report.decodable);
    println!("  Skipped:         {}", report.skipped);
    println!("  Local only:      {}", report.pending);

    if config.storage.backend == "sqlite" {
        let conn = db::open_database(expand_tilde(&config.storage.db_path))?;
        let version = db::migrations::get_schema_version(&conn)?;
        println!();
        println!("Schema version:    {version}");
        match db::integrity_problem(&conn)? {
            None => println!("Integrity check:   PASSED"),
            Some(details) => println!("Integrity check:   FAILED ({details})"),
        }
    }

    println!();
    if !report.well_formed {
        println!("Cache blob is not a JSON array; it will be ignored on load.");
        println!("Run `nomadish refresh` to rebuild it from the server.");
    } else if report.skipped > 0 {
        println!("Some entries cannot be read and are dropped on load.");
        println!("The next successful save rewrites the cache without them.");
    } else {
        println!("Cache:             OK");
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
