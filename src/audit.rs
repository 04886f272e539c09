//! Append-only log of denied requests.
//!
//! Logging is best effort: a failed append must never fail the request that
//! triggered it, so write errors are swallowed with a warning.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use tracing::warn;

use crate::gate::DenyReason;

/// Sink for deny events.
pub trait AuditSink: Send + Sync {
    /// Record one denied request. Infallible by contract.
    fn record(&self, ip: &str, reason: DenyReason, at: i64);
}

/// One recorded deny event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub ip: String,
    pub reason: DenyReason,
    pub at: i64,
}

/// File-backed audit log, one line per deny event.
pub struct FileAuditLog {
    path: PathBuf,
}

impl FileAuditLog {
    /// Create a log appending to the given file.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for FileAuditLog {
    fn record(&self, ip: &str, reason: DenyReason, at: i64) {
        let line = format_entry(ip, reason, at);
        let result = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()));

        if let Err(e) = result {
            warn!(path = %self.path.display(), error = %e, "Failed to append audit entry");
        }
    }
}

/// In-memory sink, used in tests.
#[derive(Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditLog {
    /// Create an empty in-memory log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all recorded entries.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().clone()
    }
}

impl AuditSink for MemoryAuditLog {
    fn record(&self, ip: &str, reason: DenyReason, at: i64) {
        self.entries.lock().push(AuditEntry {
            ip: ip.to_string(),
            reason,
            at,
        });
    }
}

fn format_entry(ip: &str, reason: DenyReason, at: i64) -> String {
    let timestamp = match Utc.timestamp_opt(at, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => at.to_string(),
    };
    format!("{} | IP: {} | Status: {}\n", timestamp, ip, reason.code())
}
