//! Read-only introspection for the administrative status panel.
//!
//! Never touches the admission path; it only reads configuration and the
//! counter snapshot.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde::Serialize;

use crate::config::WardenConfig;
use crate::ratelimit::{CounterStore, StoreHealth, WINDOW_SECS};

/// Snapshot of the gateway's effective protection settings and store health.
#[derive(Debug, Serialize)]
pub struct PermissionStatus {
    /// Whether a non-empty token is configured.
    pub token_configured: bool,
    /// Effective per-minute rate limit.
    pub rate_limit: u32,
    /// Parsed whitelist entries.
    pub whitelist: Vec<String>,
    /// Whether invalid tokens trigger a loopback redirect.
    pub redirect_on_invalid_token: bool,
    /// Server time the status was gathered at.
    pub current_time: String,
    /// Distinct IPs seen within the trailing window.
    pub active_ips: usize,
    /// Health of the counter store.
    pub store: StoreHealth,
}

/// Gather the current permission status.
pub async fn permission_status(
    config: &WardenConfig,
    store: &Arc<dyn CounterStore>,
    now: i64,
) -> PermissionStatus {
    let active_ips = store
        .snapshot()
        .await
        .values()
        .filter(|record| now - record.window_start < WINDOW_SECS)
        .count();

    let current_time = match Utc.timestamp_opt(now, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => now.to_string(),
    };

    PermissionStatus {
        token_configured: !config.protection.token.is_empty(),
        rate_limit: config.protection.limit_per_minute,
        whitelist: config.protection.whitelist_entries(),
        redirect_on_invalid_token: config.protection.redirect_on_invalid_token,
        current_time,
        active_ips,
        store: store.health(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::MemoryCounterStore;

    #[tokio::test]
    async fn test_status_reflects_config_and_store() {
        let mut config = WardenConfig::default();
        config.protection.token = "abc123".to_string();
        config.protection.limit_per_minute = 5;
        config.protection.whitelist = "10.0.0.1\n 10.0.0.2 ".to_string();

        let store: Arc<dyn CounterStore> = Arc::new(MemoryCounterStore::new());
        store.record_hit("a", 1_000).await;
        store.record_hit("b", 1_030).await;

        let status = permission_status(&config, &store, 1_040).await;
        assert!(status.token_configured);
        assert_eq!(status.rate_limit, 5);
        assert_eq!(status.whitelist, vec!["10.0.0.1", "10.0.0.2"]);
        assert!(!status.redirect_on_invalid_token);
        assert_eq!(status.active_ips, 2);
        assert!(status.store.exists);
    }

    #[tokio::test]
    async fn test_status_with_unconfigured_token() {
        let config = WardenConfig::default();
        let store: Arc<dyn CounterStore> = Arc::new(MemoryCounterStore::new());
        let status = permission_status(&config, &store, 0).await;
        assert!(!status.token_configured);
        assert_eq!(status.active_ips, 0);
        assert_eq!(status.current_time, "1970-01-01 00:00:00");
    }
}
