pub mod doctor;
pub mod export;
pub mod import;
pub mod inspect;
pub mod reset;
pub mod stats;
pub mod sync;

use anyhow::Result;
use std::sync::Arc;

use nomadish::cache::{self, CacheStore};
use nomadish::config::NomadishConfig;
use nomadish::memory::codec::format_date;
use nomadish::memory::types::MemoryRecord;
use nomadish::remote::http::HttpRemoteClient;
use nomadish::sync::SyncCoordinator;

/// Build a coordinator from config and load the cache into it.
pub async fn open_coordinator(config: &NomadishConfig) -> Result<SyncCoordinator> {
    let store: Arc<dyn CacheStore> = Arc::from(cache::open_cache_store(&config.storage)?);
    let remote = Arc::new(HttpRemoteClient::new(&config.server)?);
    let coordinator = SyncCoordinator::new(store, remote);
    coordinator.initialize().await;
    Ok(coordinator)
}

/// One-line summary used by `list` and after mutations.
pub fn summary_line(record: &MemoryRecord) -> String {
    let status = if record.is_pending() { " [local only]" } else { "" };
    format!(
        "{}  {:<24} {}  {}{}",
        record.id,
        record.name,
        record.rating,
        format_date(&record.date_added),
        status,
    )
}
