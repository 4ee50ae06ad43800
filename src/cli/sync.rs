//! CLI `refresh`, `add`, and `remove` commands: the ones that talk to the server.

use anyhow::{Context, Result};
use std::path::PathBuf;

use nomadish::config::NomadishConfig;
use nomadish::memory::types::{Coordinate, MemoryRecord, Rating};
use nomadish::remote::PhotoPayload;
use nomadish::sync::AddOutcome;

/// Fetch from the server and replace the cache.
pub async fn refresh(config: &NomadishConfig) -> Result<()> {
    let coordinator = super::open_coordinator(config).await?;
    let cached = coordinator.records().len();

    match coordinator.refresh().await {
        Ok(count) => println!("Refreshed: {count} memories (was {cached} cached)."),
        Err(e) => {
            eprintln!("Refresh failed: {e}");
            println!("Showing {cached} cached memories.");
        }
    }
    Ok(())
}

/// Arguments for `add`, already split out of the command line.
pub struct AddInput {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub rating: u8,
    pub notes: String,
    pub photo: PathBuf,
}

/// Add a memory with a photo. Falls back to a local-only entry if the server fails.
pub async fn add(config: &NomadishConfig, input: AddInput) -> Result<()> {
    anyhow::ensure!(!input.name.trim().is_empty(), "memory name must not be empty");
    let rating = Rating::new(input.rating)
        .with_context(|| format!("rating must be 1 to 5, got {}", input.rating))?;
    let coordinate = Coordinate::new(input.latitude, input.longitude).with_context(|| {
        format!(
            "coordinate out of range: {}, {}",
            input.latitude, input.longitude
        )
    })?;

    let bytes = std::fs::read(&input.photo)
        .with_context(|| format!("failed to read photo: {}", input.photo.display()))?;
    let extension = input.photo.extension().and_then(|e| e.to_str());
    let photo = PhotoPayload::from_file_bytes(bytes, extension);

    let candidate = MemoryRecord::new(input.name, coordinate)
        .with_rating(rating)
        .with_notes(input.notes);

    let coordinator = super::open_coordinator(config).await?;
    match coordinator.add(candidate, photo).await? {
        AddOutcome::Synced(record) => {
            println!("Added: {}", super::summary_line(&record));
        }
        AddOutcome::LocalOnly { record, reason } => {
            eprintln!("Server unavailable ({reason}); kept locally.");
            println!("Added: {}", super::summary_line(&record));
        }
    }
    Ok(())
}

/// Delete a memory on the server, then from the cache.
pub async fn remove(config: &NomadishConfig, id: &str) -> Result<()> {
    let coordinator = super::open_coordinator(config).await?;
    anyhow::ensure!(coordinator.get(id).is_some(), "memory not found in cache: {id}");

    coordinator
        .remove_id(id)
        .await
        .with_context(|| format!("memory {id} was not deleted"))?;
    println!("Deleted {id}.");
    Ok(())
}
