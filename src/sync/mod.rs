//! Reconciliation between the local cache and the memory server.
//!
//! [`SyncCoordinator`] owns the in-memory record list. It loads the cache at
//! startup, then runs `refresh` / `add` / `remove` against the server one at a
//! time, writing the full list back to the cache after every change. When the
//! server is unreachable, adds are kept locally as [`SyncStatus::PendingAdd`]
//! records and deletes are refused.
//!
//! [`SyncStatus::PendingAdd`]: crate::memory::types::SyncStatus::PendingAdd

mod coordinator;

pub use coordinator::SyncCoordinator;

use crate::memory::types::MemoryRecord;

/// Everything presentation code can observe about the coordinator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryState {
    pub records: Vec<MemoryRecord>,
    /// `true` exactly while a remote operation is in flight.
    pub is_busy: bool,
    /// Description of the most recent failure; cleared by the next remote success.
    pub last_error: Option<String>,
}

/// How an [`add`](SyncCoordinator::add) was resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// The server accepted the memory; this is its canonical record.
    Synced(MemoryRecord),
    /// The server call failed; the candidate was kept locally.
    LocalOnly { record: MemoryRecord, reason: String },
}

impl AddOutcome {
    pub fn record(&self) -> &MemoryRecord {
        match self {
            Self::Synced(record) | Self::LocalOnly { record, .. } => record,
        }
    }

    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Synced(_))
    }
}
