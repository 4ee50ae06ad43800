//! Single-file JSON cache backend.
//!
//! Writes go to a hidden sibling temp file which is flushed, synced, and
//! renamed over the target, so readers see either the old blob or the new one.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::{CacheStore, CACHE_KEY};
use crate::error::PersistenceError;

/// Cache stored as one JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    path: PathBuf,
}

impl FileCacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache file named after [`CACHE_KEY`] inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(format!("{CACHE_KEY}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{CACHE_KEY}.json"));
        self.path.with_file_name(format!(".{name}.tmp"))
    }

    fn write_temp(&self, tmp: &Path, blob: &str) -> io::Result<()> {
        let mut file = fs::File::create(tmp)?;
        file.write_all(blob.as_bytes())?;
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }
}

impl CacheStore for FileCacheStore {
    fn read_blob(&self) -> Result<Option<String>, PersistenceError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(super::blob_text(bytes, &self.location()))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_blob(&self, blob: &str) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.temp_path();
        if let Err(e) = self.write_temp(&tmp, blob) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_reads_as_none() {
        let tmp = TempDir::new().unwrap();
        let store = FileCacheStore::in_dir(tmp.path());
        assert!(store.read_blob().unwrap().is_none());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn write_creates_parent_dirs_and_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let store = FileCacheStore::new(tmp.path().join("nested").join("cache.json"));
        store.write_blob("[]").unwrap();
        assert_eq!(store.read_blob().unwrap().as_deref(), Some("[]"));
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn write_replaces_previous_blob() {
        let tmp = TempDir::new().unwrap();
        let store = FileCacheStore::in_dir(tmp.path());
        store.write_blob("[1]").unwrap();
        store.write_blob("[2]").unwrap();
        assert_eq!(store.read_blob().unwrap().as_deref(), Some("[2]"));
    }

    #[test]
    fn failed_write_keeps_previous_blob() {
        let tmp = TempDir::new().unwrap();
        let store = FileCacheStore::in_dir(tmp.path());
        store.write_blob("[\"old\"]").unwrap();

        // A directory squatting on the temp path makes the temp write fail.
        fs::create_dir(store.temp_path()).unwrap();
        assert!(store.write_blob("[\"new\"]").is_err());
        assert_eq!(store.read_blob().unwrap().as_deref(), Some("[\"old\"]"));
    }

    #[test]
    fn invalid_utf8_is_read_lossily() {
        let tmp = TempDir::new().unwrap();
        let store = FileCacheStore::in_dir(tmp.path());
        fs::write(store.path(), b"[\"ok\", \"\xFF\xFE\"]").unwrap();
        assert_eq!(
            store.read_blob().unwrap().as_deref(),
            Some("[\"ok\", \"\u{FFFD}\u{FFFD}\"]")
        );
    }

    #[test]
    fn clear_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = FileCacheStore::in_dir(tmp.path());
        store.write_blob("[]").unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.read_blob().unwrap().is_none());
    }
}
