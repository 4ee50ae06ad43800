use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use super::{AddOutcome, MemoryState};
use crate::cache::CacheStore;
use crate::error::{RemoteError, SyncError};
use crate::memory::codec;
use crate::memory::types::{MemoryRecord, SyncStatus};
use crate::remote::{PhotoPayload, RemoteClient};

/// Owner of the observable memory list.
///
/// Every operation takes `op_lock` for its whole duration, so a second call
/// waits until the first has finished and written the cache. State changes are
/// published through a `watch` channel; readers never block writers.
pub struct SyncCoordinator {
    cache: Arc<dyn CacheStore>,
    remote: Arc<dyn RemoteClient>,
    state: watch::Sender<MemoryState>,
    op_lock: Mutex<()>,
}

/// Sets `is_busy` for as long as it lives, including on early return or unwind.
struct BusyGuard<'a> {
    state: &'a watch::Sender<MemoryState>,
}

impl<'a> BusyGuard<'a> {
    fn enter(state: &'a watch::Sender<MemoryState>) -> Self {
        state.send_modify(|s| s.is_busy = true);
        Self { state }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.is_busy = false);
    }
}

impl SyncCoordinator {
    pub fn new(cache: Arc<dyn CacheStore>, remote: Arc<dyn RemoteClient>) -> Self {
        let (state, _) = watch::channel(MemoryState::default());
        Self {
            cache,
            remote,
            state,
            op_lock: Mutex::new(()),
        }
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<MemoryState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> MemoryState {
        self.state.borrow().clone()
    }

    pub fn records(&self) -> Vec<MemoryRecord> {
        self.state.borrow().records.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.state.borrow().is_busy
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.borrow().last_error.clone()
    }

    pub fn get(&self, id: &str) -> Option<MemoryRecord> {
        self.state.borrow().records.iter().find(|r| r.id == id).cloned()
    }

    /// Records the server has not confirmed yet.
    pub fn pending(&self) -> Vec<MemoryRecord> {
        self.state
            .borrow()
            .records
            .iter()
            .filter(|r| r.is_pending())
            .cloned()
            .collect()
    }

    /// Populate the list from the cache. Makes no remote call.
    ///
    /// A cache that cannot be read is logged and treated as empty.
    pub async fn initialize(&self) -> usize {
        let _op = self.op_lock.lock().await;

        let cache = Arc::clone(&self.cache);
        let loaded = match tokio::task::spawn_blocking(move || cache.load()).await {
            Ok(result) => result.map_err(SyncError::from),
            Err(e) => Err(SyncError::from(e)),
        };
        let records = match loaded {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, "failed to read memory cache, starting empty");
                self.state.send_modify(|s| s.last_error = Some(e.to_string()));
                Vec::new()
            }
        };

        let count = records.len();
        self.state.send_modify(|s| s.records = records);
        tracing::info!(count, "memories initialized from cache");
        count
    }

    /// Replace the list with the server's collection and mirror it to the cache.
    ///
    /// Any undecodable server record fails the whole refresh; on failure the
    /// list and the cache are left as they were. Returns the number of records.
    pub async fn refresh(&self) -> Result<usize, SyncError> {
        let _op = self.op_lock.lock().await;
        let _busy = BusyGuard::enter(&self.state);

        let fetched = match self.remote.fetch_all().await {
            Ok(values) => codec::decode_all(&values).map_err(RemoteError::from),
            Err(e) => Err(e),
        };
        let mut records = match fetched {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "refresh failed, keeping cached memories");
                return Err(self.remote_failure(e));
            }
        };
        for record in &mut records {
            record.sync_status = SyncStatus::Synced;
        }
        let records = dedup_by_id(records);

        let dropped = {
            let state = self.state.borrow();
            let server_ids: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
            state
                .records
                .iter()
                .filter(|r| r.is_pending() && !server_ids.contains(r.id.as_str()))
                .count()
        };
        if dropped > 0 {
            tracing::warn!(dropped, "refresh discarded local-only memories unknown to the server");
        }

        let count = records.len();
        self.state.send_modify(|s| {
            s.records = records.clone();
            s.last_error = None;
        });
        tracing::info!(count, "memories refreshed from server");

        self.persist(records).await?;
        Ok(count)
    }

    /// Send a new memory and its photo to the server.
    ///
    /// On success the server's record is added to the list. On failure the
    /// candidate is added as a local-only [`SyncStatus::PendingAdd`] record so
    /// the user's entry is never lost. Either way the cache is rewritten.
    pub async fn add(
        &self,
        candidate: MemoryRecord,
        photo: PhotoPayload,
    ) -> Result<AddOutcome, SyncError> {
        let _op = self.op_lock.lock().await;
        let _busy = BusyGuard::enter(&self.state);

        let wire = codec::encode(&candidate);
        let saved = match self.remote.add(&wire, &photo).await {
            Ok(value) => codec::decode(&value).map_err(RemoteError::from),
            Err(e) => Err(e),
        };

        let outcome = match saved {
            Ok(mut record) => {
                record.sync_status = SyncStatus::Synced;
                tracing::info!(id = %record.id, name = %record.name, "memory added on server");
                AddOutcome::Synced(record)
            }
            Err(e) => {
                tracing::warn!(id = %candidate.id, error = %e, "add failed, keeping memory locally");
                let mut record = candidate;
                record.sync_status = SyncStatus::PendingAdd;
                AddOutcome::LocalOnly {
                    record,
                    reason: e.to_string(),
                }
            }
        };

        let record = outcome.record().clone();
        let last_error = match &outcome {
            AddOutcome::Synced(_) => None,
            AddOutcome::LocalOnly { reason, .. } => Some(format!("saved locally only: {reason}")),
        };
        let mut records = Vec::new();
        self.state.send_modify(|s| {
            upsert(&mut s.records, record);
            s.last_error = last_error;
            records = s.records.clone();
        });

        self.persist(records).await?;
        Ok(outcome)
    }

    /// Delete a memory. Convenience wrapper over [`remove_id`](Self::remove_id).
    pub async fn remove(&self, record: &MemoryRecord) -> Result<(), SyncError> {
        self.remove_id(&record.id).await
    }

    /// Delete the memory with `id` on the server, then locally.
    ///
    /// A failed remote delete leaves the list untouched. Local-only records
    /// were never sent to the server, so they are dropped without a remote call.
    pub async fn remove_id(&self, id: &str) -> Result<(), SyncError> {
        let _op = self.op_lock.lock().await;

        let pending = self
            .state
            .borrow()
            .records
            .iter()
            .any(|r| r.id == id && r.is_pending());

        if pending {
            tracing::info!(id, "removing local-only memory");
        } else {
            let _busy = BusyGuard::enter(&self.state);
            if let Err(e) = self.remote.delete(id).await {
                tracing::warn!(id, error = %e, "delete failed, keeping memory");
                return Err(self.remote_failure(e));
            }
            tracing::info!(id, "memory deleted on server");
        }

        let mut removed = false;
        let mut records = Vec::new();
        self.state.send_modify(|s| {
            let before = s.records.len();
            s.records.retain(|r| r.id != id);
            removed = s.records.len() != before;
            if !pending {
                s.last_error = None;
            }
            records = s.records.clone();
        });

        if removed {
            self.persist(records).await?;
        }
        Ok(())
    }

    /// Add records that are not already present (by id) without contacting
    /// the server, then rewrite the cache. Returns how many were added.
    pub async fn merge_local(&self, incoming: Vec<MemoryRecord>) -> Result<usize, SyncError> {
        let _op = self.op_lock.lock().await;

        let mut added = 0;
        let mut records = Vec::new();
        self.state.send_modify(|s| {
            let mut ids: HashSet<String> = s.records.iter().map(|r| r.id.clone()).collect();
            for record in incoming {
                if ids.insert(record.id.clone()) {
                    s.records.push(record);
                    added += 1;
                }
            }
            records = s.records.clone();
        });

        if added > 0 {
            self.persist(records).await?;
        }
        Ok(added)
    }

    fn remote_failure(&self, error: RemoteError) -> SyncError {
        self.state.send_modify(|s| s.last_error = Some(error.to_string()));
        SyncError::Remote(error)
    }

    async fn persist(&self, records: Vec<MemoryRecord>) -> Result<(), SyncError> {
        let cache = Arc::clone(&self.cache);
        let result = match tokio::task::spawn_blocking(move || cache.save(&records)).await {
            Ok(saved) => saved.map_err(SyncError::from),
            Err(e) => Err(SyncError::from(e)),
        };
        if let Err(e) = &result {
            tracing::error!(error = %e, location = %self.cache.location(), "failed to write memory cache");
            self.state.send_modify(|s| s.last_error = Some(e.to_string()));
        }
        result
    }
}

/// Replace the record with the same id in place, or append it.
fn upsert(records: &mut Vec<MemoryRecord>, record: MemoryRecord) {
    match records.iter_mut().find(|r| r.id == record.id) {
        Some(existing) => *existing = record,
        None => records.push(record),
    }
}

/// Keep the first record for each id.
fn dedup_by_id(records: Vec<MemoryRecord>) -> Vec<MemoryRecord> {
    let mut seen = HashSet::new();
    let before = records.len();
    let records: Vec<_> = records
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect();
    if records.len() != before {
        tracing::warn!(duplicates = before - records.len(), "server returned duplicate memory ids");
    }
    records
}
