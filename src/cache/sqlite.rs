//! SQLite cache backend: the blob lives in one `cache_blobs` row keyed by
//! [`CACHE_KEY`], replaced inside a transaction.

use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{CacheStore, CACHE_KEY};
use crate::error::PersistenceError;

pub struct SqliteCacheStore {
    conn: Mutex<Connection>,
    location: String,
}

impl SqliteCacheStore {
    /// Wrap a connection opened with [`crate::db::open_database`] (or
    /// [`crate::db::open_memory_database`]).
    pub fn new(conn: Connection) -> Self {
        let location = conn
            .path()
            .filter(|p| !p.is_empty())
            .map(|p| format!("sqlite:{p}"))
            .unwrap_or_else(|| "sqlite::memory:".to_string());
        Self {
            conn: Mutex::new(conn),
            location,
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// When the blob was last replaced, as stored by the v2 schema.
    pub fn updated_at(&self) -> Result<Option<String>, PersistenceError> {
        let conn = self.conn();
        let updated: Option<Option<String>> = conn
            .query_row(
                "SELECT updated_at FROM cache_blobs WHERE key = ?1",
                params![CACHE_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(updated.flatten())
    }
}

impl CacheStore for SqliteCacheStore {
    fn read_blob(&self) -> Result<Option<String>, PersistenceError> {
        let conn = self.conn();
        let bytes = conn
            .query_row(
                "SELECT value FROM cache_blobs WHERE key = ?1",
                params![CACHE_KEY],
                |row| match row.get_ref(0)? {
                    ValueRef::Text(bytes) | ValueRef::Blob(bytes) => Ok(bytes.to_vec()),
                    other => Err(rusqlite::Error::InvalidColumnType(
                        0,
                        "value".into(),
                        other.data_type(),
                    )),
                },
            )
            .optional()?;
        Ok(bytes.map(|b| super::blob_text(b, &self.location)))
    }

    fn write_blob(&self, blob: &str) -> Result<(), PersistenceError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO cache_blobs (key, value, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![CACHE_KEY, blob, chrono::Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        self.conn()
            .execute("DELETE FROM cache_blobs WHERE key = ?1", params![CACHE_KEY])?;
        Ok(())
    }

    fn location(&self) -> String {
        self.location.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn store() -> SqliteCacheStore {
        SqliteCacheStore::new(db::open_memory_database().unwrap())
    }

    #[test]
    fn empty_database_reads_as_none() {
        let store = store();
        assert!(store.read_blob().unwrap().is_none());
        assert!(store.updated_at().unwrap().is_none());
        assert_eq!(store.location(), "sqlite::memory:");
    }

    #[test]
    fn write_replaces_single_row() {
        let store = store();
        store.write_blob("[1]").unwrap();
        store.write_blob("[2]").unwrap();
        assert_eq!(store.read_blob().unwrap().as_deref(), Some("[2]"));
        assert!(store.updated_at().unwrap().is_some());

        let rows: i64 = store
            .conn()
            .query_row("SELECT COUNT(*) FROM cache_blobs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn invalid_utf8_text_is_read_lossily() {
        let store = store();
        // `["<0xFF>"]` stored as TEXT
        store
            .conn()
            .execute(
                "INSERT INTO cache_blobs (key, value) VALUES (?1, CAST(X'5B22FF225D' AS TEXT))",
                params![CACHE_KEY],
            )
            .unwrap();
        assert_eq!(store.read_blob().unwrap().as_deref(), Some("[\"\u{FFFD}\"]"));
    }

    #[test]
    fn clear_removes_blob() {
        let store = store();
        store.write_blob("[]").unwrap();
        store.clear().unwrap();
        assert!(store.read_blob().unwrap().is_none());
    }
}
