//! Durable counter storage.
//!
//! The store is the single shared mutable resource of the admission path, so
//! every implementation must make `record_hit` an atomic read-modify-write:
//! two concurrent hits for the same key must never lose an increment.
//!
//! Read and write failures never fail an admission check. A missing or
//! undecodable snapshot is treated as empty and write errors are swallowed
//! with a warning; both only surface through [`CounterStore::health`].

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

use super::counter::{apply_hit, CounterMap, CounterRecord, WINDOW_SECS};

/// Health of the backing store, reported on the status panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreHealth {
    /// Whether the snapshot exists at all.
    pub exists: bool,
    /// Whether the snapshot can be opened for reading.
    pub readable: bool,
    /// Whether the snapshot can be written.
    pub writable: bool,
}

impl StoreHealth {
    fn absent() -> Self {
        Self {
            exists: false,
            readable: false,
            writable: false,
        }
    }
}

/// Storage seam for per-IP counters.
///
/// Abstracting the store keeps the limiter and gate independent of the
/// backend, so a shared counter service can be substituted for the local
/// file store later.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically record one hit for `key` at `now` and return the updated
    /// record. Implementations also sweep records whose window elapsed.
    async fn record_hit(&self, key: &str, now: i64) -> CounterRecord;

    /// Copy of all live records, for status introspection.
    async fn snapshot(&self) -> CounterMap;

    /// Current health of the backing storage.
    fn health(&self) -> StoreHealth;
}

/// File-backed store persisting the counter map as one JSON snapshot.
///
/// A single mutex guards the whole load-mutate-save cycle, which is what
/// makes concurrent hits safe.
pub struct FileCounterStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCounterStore {
    /// Create a store backed by the given snapshot path.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_snapshot(&self) -> CounterMap {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return CounterMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Counter snapshot unreadable, treating as empty");
                return CounterMap::new();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(map) => map,
            Err(e) => {
                // Fail open: a corrupt snapshot resets the counters rather
                // than denying service.
                warn!(path = %self.path.display(), error = %e, "Counter snapshot corrupt, treating as empty");
                CounterMap::new()
            }
        }
    }

    fn write_snapshot(&self, map: &CounterMap) {
        let bytes = match serde_json::to_vec(map) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Failed to encode counter snapshot");
                return;
            }
        };

        if let Err(e) = fs::write(&self.path, bytes) {
            // The admission decision is already made; a failed write must
            // not change the response.
            warn!(path = %self.path.display(), error = %e, "Failed to persist counter snapshot");
        }
    }
}

#[async_trait]
impl CounterStore for FileCounterStore {
    async fn record_hit(&self, key: &str, now: i64) -> CounterRecord {
        let _guard = self.lock.lock();
        let mut map = self.read_snapshot();
        let record = apply_hit(&mut map, key, now);
        self.write_snapshot(&map);
        debug!(key, count = record.count, "Recorded hit");
        record
    }

    async fn snapshot(&self) -> CounterMap {
        let _guard = self.lock.lock();
        self.read_snapshot()
    }

    fn health(&self) -> StoreHealth {
        match fs::metadata(&self.path) {
            Ok(meta) => StoreHealth {
                exists: true,
                readable: fs::File::open(&self.path).is_ok(),
                writable: !meta.permissions().readonly(),
            },
            Err(_) => StoreHealth::absent(),
        }
    }
}

/// In-memory store, used in tests and available as a non-durable backend.
///
/// `DashMap` entry locking keeps per-key updates atomic; the sweep runs as a
/// separate `retain` pass.
#[derive(Default)]
pub struct MemoryCounterStore {
    records: DashMap<String, CounterRecord>,
}

impl MemoryCounterStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn record_hit(&self, key: &str, now: i64) -> CounterRecord {
        let record = {
            let mut entry = self
                .records
                .entry(key.to_string())
                .or_insert(CounterRecord {
                    count: 0,
                    window_start: now,
                });
            if now - entry.window_start < WINDOW_SECS {
                entry.count += 1;
            } else {
                entry.count = 1;
                entry.window_start = now;
            }
            *entry
        };
        self.records
            .retain(|_, record| now - record.window_start < WINDOW_SECS);
        record
    }

    async fn snapshot(&self) -> CounterMap {
        self.records
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    fn health(&self) -> StoreHealth {
        StoreHealth {
            exists: true,
            readable: true,
            writable: true,
        }
    }
}
