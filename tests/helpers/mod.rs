#![allow(dead_code)]

use async_trait::async_trait;
use nomadish::cache::file::FileCacheStore;
use nomadish::cache::CacheStore;
use nomadish::error::{PersistenceError, RemoteError};
use nomadish::memory::codec::WireRecord;
use nomadish::memory::types::{Coordinate, MemoryRecord, Rating};
use nomadish::remote::{PhotoPayload, RemoteClient};
use nomadish::sync::SyncCoordinator;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-process stand-in for the memory server.
///
/// Holds a collection of wire records, assigns `srv-N` ids on add, and can be
/// switched offline to make every call fail.
#[derive(Default)]
pub struct MockRemote {
    server: Mutex<Vec<Value>>,
    offline: AtomicBool,
    next_id: AtomicUsize,
    delay: Mutex<Option<Duration>>,
    uploads: Mutex<Vec<PhotoPayload>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Counts a call as in flight until dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_server(records: Vec<Value>) -> Arc<Self> {
        let remote = Self::default();
        *remote.server.lock().unwrap() = records;
        Arc::new(remote)
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn server_records(&self) -> Vec<Value> {
        self.server.lock().unwrap().clone()
    }

    pub fn push_server_record(&self, record: Value) {
        self.server.lock().unwrap().push(record);
    }

    pub fn uploads(&self) -> Vec<PhotoPayload> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls that were ever running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn begin(&self) -> InFlight<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight(&self.in_flight)
    }

    async fn enter(&self) -> Result<(), RemoteError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::NetworkUnavailable("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteClient for MockRemote {
    async fn fetch_all(&self) -> Result<Vec<Value>, RemoteError> {
        let _flight = self.begin();
        self.enter().await?;
        Ok(self.server_records())
    }

    async fn add(&self, record: &WireRecord, photo: &PhotoPayload) -> Result<Value, RemoteError> {
        let _flight = self.begin();
        self.enter().await?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("srv-{n}");

        let mut saved = record.clone();
        saved.remove("sync_status");
        saved.insert("id".into(), json!(id));
        saved.insert("image_url".into(), json!(format!("https://img.example/{id}.jpg")));
        let saved = Value::Object(saved);

        self.uploads.lock().unwrap().push(photo.clone());
        self.server.lock().unwrap().push(saved.clone());
        Ok(saved)
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        let _flight = self.begin();
        self.enter().await?;
        let mut server = self.server.lock().unwrap();
        let before = server.len();
        server.retain(|r| r["id"] != json!(id));
        if server.len() == before {
            return Err(RemoteError::ServerError(404));
        }
        Ok(())
    }
}

/// File cache whose writes can be switched to fail, as on a full disk.
pub struct FlakyCache {
    inner: FileCacheStore,
    fail_writes: AtomicBool,
}

impl FlakyCache {
    pub fn in_dir(dir: &Path) -> Arc<Self> {
        Arc::new(Self {
            inner: FileCacheStore::in_dir(dir),
            fail_writes: AtomicBool::new(false),
        })
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }
}

impl CacheStore for FlakyCache {
    fn read_blob(&self) -> Result<Option<String>, PersistenceError> {
        self.inner.read_blob()
    }

    fn write_blob(&self, blob: &str) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("no space left on device").into());
        }
        self.inner.write_blob(blob)
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        self.inner.clear()
    }

    fn location(&self) -> String {
        self.inner.location()
    }
}

/// A wire-format record as the server would send it.
pub fn wire_record(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "date_added": "2025-08-16T10:15:30.123456",
        "notes": "",
        "rating": 4,
        "latitude": 35.0,
        "longitude": 139.0,
        "image_url": format!("https://img.example/{id}.jpg")
    })
}

/// A fresh local candidate, as the add screen would build it.
pub fn candidate(name: &str, stars: u8, latitude: f64, longitude: f64) -> MemoryRecord {
    MemoryRecord::new(name, Coordinate::new(latitude, longitude).unwrap())
        .with_rating(Rating::new(stars).unwrap())
}

pub fn photo() -> PhotoPayload {
    PhotoPayload::jpeg(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10])
}

pub fn file_cache(dir: &Path) -> Arc<FileCacheStore> {
    Arc::new(FileCacheStore::in_dir(dir))
}

/// Coordinator over a file cache in `dir`, already initialized.
pub async fn coordinator(dir: &Path, remote: Arc<MockRemote>) -> SyncCoordinator {
    let cache: Arc<dyn CacheStore> = file_cache(dir);
    let coordinator = SyncCoordinator::new(cache, remote);
    coordinator.initialize().await;
    coordinator
}

/// Raw bytes of the durable cache file in `dir`, if any.
pub fn cache_bytes(dir: &Path) -> Option<Vec<u8>> {
    std::fs::read(FileCacheStore::in_dir(dir).path()).ok()
}

pub fn ids(records: &[MemoryRecord]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}
