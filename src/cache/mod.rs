//! Durable whole-collection persistence for memory records.
//!
//! Provides the [`CacheStore`] trait and two backends: a single JSON file
//! ([`file::FileCacheStore`]) and a SQLite key-value row
//! ([`sqlite::SqliteCacheStore`]). Both store the same blob: a JSON array of
//! records in the codec's object form, replaced in full on every save.

pub mod file;
pub mod sqlite;

use anyhow::Result;
use serde_json::Value;
use std::collections::HashSet;

use crate::error::PersistenceError;
use crate::memory::codec;
use crate::memory::types::MemoryRecord;

/// Fixed name of the durable blob (file stem or `cache_blobs.key`).
pub const CACHE_KEY: &str = "foodmemories";

/// Durable storage for the full record set.
///
/// Backends only move raw blobs; decoding and the skip-bad-records policy
/// live in the provided [`load`](CacheStore::load) and
/// [`save`](CacheStore::save). There is a single writer per process.
pub trait CacheStore: Send + Sync {
    /// Read the stored blob, or `None` if nothing was ever saved.
    fn read_blob(&self) -> Result<Option<String>, PersistenceError>;

    /// Replace the stored blob. Must be atomic: a concurrent or later
    /// `read_blob` sees either the old blob or the new one, never a mix.
    fn write_blob(&self, blob: &str) -> Result<(), PersistenceError>;

    /// Remove the stored blob entirely.
    fn clear(&self) -> Result<(), PersistenceError>;

    /// Human-readable location, for logs and diagnostics.
    fn location(&self) -> String;

    /// Load every decodable record. Missing or malformed blobs yield an empty list.
    fn load(&self) -> Result<Vec<MemoryRecord>, PersistenceError> {
        let Some(blob) = self.read_blob()? else {
            tracing::info!(location = %self.location(), "no cache blob found, starting fresh");
            return Ok(Vec::new());
        };
        let contents = decode_blob(&blob);
        tracing::info!(
            location = %self.location(),
            loaded = contents.records.len(),
            skipped = contents.skipped,
            "loaded cached memories"
        );
        Ok(contents.records)
    }

    /// Serialize and store the entire collection.
    fn save(&self, records: &[MemoryRecord]) -> Result<(), PersistenceError> {
        let blob = encode_blob(records)?;
        self.write_blob(&blob)?;
        tracing::debug!(location = %self.location(), saved = records.len(), "saved cached memories");
        Ok(())
    }
}

/// Result of decoding a cache blob leniently.
#[derive(Debug, Default)]
pub struct BlobContents {
    pub records: Vec<MemoryRecord>,
    /// Number of array elements in the blob (0 if it was not an array).
    pub total_entries: usize,
    /// Elements dropped because they failed to decode or repeated an id.
    pub skipped: usize,
    /// `false` if the blob was not valid JSON or not an array.
    pub well_formed: bool,
}

/// Serialize records as a pretty-printed JSON array.
pub fn encode_blob(records: &[MemoryRecord]) -> Result<String, serde_json::Error> {
    let array: Vec<Value> = records
        .iter()
        .map(|r| Value::Object(codec::encode(r)))
        .collect();
    serde_json::to_string_pretty(&array)
}

/// Decode each element of a blob independently, skipping failures.
///
/// A record whose id already appeared earlier in the blob is also skipped.
pub fn decode_blob(blob: &str) -> BlobContents {
    let entries = match serde_json::from_str::<Value>(blob) {
        Ok(Value::Array(entries)) => entries,
        Ok(other) => {
            tracing::warn!(kind = json_kind(&other), "cache blob is not a JSON array, ignoring it");
            return BlobContents::default();
        }
        Err(e) => {
            tracing::warn!(error = %e, "cache blob is not valid JSON, ignoring it");
            return BlobContents::default();
        }
    };

    let mut contents = BlobContents {
        total_entries: entries.len(),
        well_formed: true,
        ..Default::default()
    };
    let mut seen = HashSet::new();

    for (index, entry) in entries.iter().enumerate() {
        match codec::decode(entry) {
            Ok(record) if seen.insert(record.id.clone()) => contents.records.push(record),
            Ok(record) => {
                tracing::warn!(index, id = %record.id, "skipping cached memory with duplicate id");
                contents.skipped += 1;
            }
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping undecodable cached memory");
                contents.skipped += 1;
            }
        }
    }

    contents
}

/// Turn stored bytes into blob text. Invalid UTF-8 is replaced rather than
/// rejected, so one damaged record cannot hide the rest of the blob.
pub(crate) fn blob_text(bytes: Vec<u8>, location: &str) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(
                location,
                valid_up_to = e.utf8_error().valid_up_to(),
                "cache blob is not valid UTF-8, replacing bad bytes"
            );
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Health report for the durable cache.
#[derive(Debug)]
pub struct CacheHealth {
    pub location: String,
    pub exists: bool,
    pub blob_bytes: usize,
    pub well_formed: bool,
    pub total_entries: usize,
    pub decodable: usize,
    pub skipped: usize,
    pub pending: usize,
}

/// Inspect the stored blob without modifying it.
pub fn check_cache_health(store: &dyn CacheStore) -> Result<CacheHealth, PersistenceError> {
    let location = store.location();
    let Some(blob) = store.read_blob()? else {
        return Ok(CacheHealth {
            location,
            exists: false,
            blob_bytes: 0,
            well_formed: true,
            total_entries: 0,
            decodable: 0,
            skipped: 0,
            pending: 0,
        });
    };

    let contents = decode_blob(&blob);
    Ok(CacheHealth {
        location,
        exists: true,
        blob_bytes: blob.len(),
        well_formed: contents.well_formed,
        total_entries: contents.total_entries,
        decodable: contents.records.len(),
        skipped: contents.skipped,
        pending: contents.records.iter().filter(|r| r.is_pending()).count(),
    })
}

/// Open the cache backend selected in config.
pub fn open_cache_store(
    config: &crate::config::StorageConfig,
) -> Result<Box<dyn CacheStore>> {
    match config.backend.as_str() {
        "file" => {
            let path = crate::config::expand_tilde(&config.cache_path);
            Ok(Box::new(file::FileCacheStore::new(path)))
        }
        "sqlite" => {
            let path = crate::config::expand_tilde(&config.db_path);
            let conn = crate::db::open_database(&path)?;
            Ok(Box::new(sqlite::SqliteCacheStore::new(conn)))
        }
        other => anyhow::bail!("unknown storage backend: {other}. Supported: file, sqlite"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(id: &str) -> Value {
        json!({
            "id": id,
            "name": "Dumplings",
            "date_added": "2025-08-16T10:15:30Z",
            "notes": "",
            "rating": 5,
            "latitude": 31.23,
            "longitude": 121.47
        })
    }

    #[test]
    fn decode_blob_skips_only_bad_entries() {
        let blob = json!([entry("a"), {"id": "b"}, entry("c")]).to_string();
        let contents = decode_blob(&blob);
        assert!(contents.well_formed);
        assert_eq!(contents.total_entries, 3);
        assert_eq!(contents.skipped, 1);
        let ids: Vec<_> = contents.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn decode_blob_keeps_first_of_duplicate_ids() {
        let mut second = entry("a");
        second["name"] = json!("Later");
        let blob = json!([entry("a"), second]).to_string();
        let contents = decode_blob(&blob);
        assert_eq!(contents.records.len(), 1);
        assert_eq!(contents.records[0].name, "Dumplings");
        assert_eq!(contents.skipped, 1);
    }

    #[test]
    fn decode_blob_tolerates_garbage() {
        assert!(decode_blob("{not json").records.is_empty());
        assert!(!decode_blob("{not json").well_formed);
        assert!(decode_blob(r#"{"id": "a"}"#).records.is_empty());
        assert!(decode_blob("[]").well_formed);
    }

    #[test]
    fn encode_blob_is_a_json_array() {
        let contents = decode_blob(&json!([entry("a")]).to_string());
        let blob = encode_blob(&contents.records).unwrap();
        let parsed: Value = serde_json::from_str(&blob).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
        assert_eq!(parsed[0]["id"], json!("a"));
    }

    #[test]
    fn open_cache_store_selects_backend() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = crate::config::StorageConfig {
            backend: "file".into(),
            cache_path: tmp.path().join("c.json").to_string_lossy().into_owned(),
            db_path: tmp.path().join("c.db").to_string_lossy().into_owned(),
        };
        assert!(open_cache_store(&config).unwrap().location().contains("c.json"));

        config.backend = "sqlite".into();
        assert!(open_cache_store(&config).unwrap().location().starts_with("sqlite:"));

        config.backend = "redis".into();
        assert!(open_cache_store(&config).is_err());
    }
}
