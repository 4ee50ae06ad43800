//! Error taxonomy for the codec, cache, remote client, and coordinator.
//!
//! The coordinator only distinguishes success from failure when choosing a
//! fallback; the variants exist so callers and logs can tell what went wrong.

/// A wire or durable object could not be turned into a [`MemoryRecord`].
///
/// [`MemoryRecord`]: crate::memory::types::MemoryRecord
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// A required key is absent or `null`.
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    /// `date_added` matched none of the accepted date encodings.
    #[error("invalid date: {0:?}")]
    InvalidDate(String),
    /// A key is present but holds the wrong JSON type.
    #[error("field `{field}` should be {expected}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
    },
    /// A numeric field is outside its allowed range.
    #[error("field `{field}` out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

/// Failure talking to the memory server.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Connection refused, DNS failure, timeout, or any other transport error.
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),
    /// The server answered with an unexpected status code.
    #[error("server returned status {0}")]
    ServerError(u16),
    /// The server's body parsed as JSON but not as memory records.
    #[error("undecodable server payload: {0}")]
    Decode(#[from] DecodeError),
    /// The server's body was not the JSON shape expected at all.
    #[error("invalid server response: {0}")]
    InvalidResponse(String),
}

/// Failure reading or writing the durable cache.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Error reported by a [`SyncCoordinator`](crate::sync::SyncCoordinator) operation.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("remote operation failed: {0}")]
    Remote(#[from] RemoteError),
    #[error("cache write failed: {0}")]
    Persistence(#[from] PersistenceError),
    /// The blocking cache task panicked or was cancelled.
    #[error("cache task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
