//! Per-IP counter records and window math.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Fixed admission window in seconds.
pub const WINDOW_SECS: i64 = 60;

/// Request count for one IP within its current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRecord {
    /// Requests seen since the window started. Always at least 1.
    pub count: u64,
    /// Unix timestamp of the first request in the current window.
    pub window_start: i64,
}

/// Flat key -> record mapping, the persisted snapshot shape.
pub type CounterMap = HashMap<String, CounterRecord>;

/// Derive the store key for an IP.
///
/// The IP is hashed so raw addresses are not embedded as literal map keys.
/// SHA-256 is stable and does not collide across dotted-quad or IPv6 strings.
pub fn counter_key(ip: &str) -> String {
    format!("xmlrpc_rate_{:x}", Sha256::digest(ip.as_bytes()))
}

/// Apply one hit for `key` at `now` and sweep stale entries.
///
/// A missing record or an elapsed window starts a fresh `{count: 1,
/// window_start: now}` record; a live window increments in place. The
/// increment happens whether or not the caller ends up rejecting the
/// request, so rejected requests keep counting toward the window.
pub fn apply_hit(map: &mut CounterMap, key: &str, now: i64) -> CounterRecord {
    let record = match map.get(key) {
        Some(prev) if now - prev.window_start < WINDOW_SECS => CounterRecord {
            count: prev.count + 1,
            window_start: prev.window_start,
        },
        _ => CounterRecord {
            count: 1,
            window_start: now,
        },
    };
    map.insert(key.to_string(), record);
    sweep(map, now);
    record
}

/// Drop every record whose window elapsed before `now`.
///
/// Keeps the map bounded by the number of IPs active in the trailing window.
pub fn sweep(map: &mut CounterMap, now: i64) {
    map.retain(|_, record| now - record.window_start < WINDOW_SECS);
}
