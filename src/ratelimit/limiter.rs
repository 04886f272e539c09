//! Core rate limiter implementation.

use std::sync::Arc;

use tracing::debug;

use super::counter::counter_key;
use super::store::CounterStore;

/// Fixed-window admission decision built on a [`CounterStore`].
///
/// Every check records a hit first and compares the resulting count against
/// the limit, so rejected requests keep counting toward the window: a
/// sustained flood stays rejected until the window resets.
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
}

impl RateLimiter {
    /// Create a rate limiter over the given store.
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Record a hit for `ip` and decide whether it fits within `limit`
    /// requests per window.
    ///
    /// A limit of 0 rejects every request, since the recorded count is
    /// always at least 1.
    pub async fn admit(&self, ip: &str, limit: u32, now: i64) -> bool {
        let record = self.store.record_hit(&counter_key(ip), now).await;
        let admitted = record.count <= u64::from(limit);
        if !admitted {
            debug!(ip, count = record.count, limit, "Rate limit exceeded");
        }
        admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::store::MemoryCounterStore;

    fn limiter() -> RateLimiter {
        RateLimiter::new(Arc::new(MemoryCounterStore::new()))
    }

    #[tokio::test]
    async fn test_admits_up_to_limit() {
        let limiter = limiter();
        for i in 0..5 {
            assert!(limiter.admit("10.0.0.1", 5, 1_000 + i).await, "hit {i}");
        }
        assert!(!limiter.admit("10.0.0.1", 5, 1_010).await);
    }

    #[tokio::test]
    async fn test_window_reset_admits_again() {
        let limiter = limiter();
        assert!(limiter.admit("10.0.0.1", 2, 1_000).await);
        assert!(limiter.admit("10.0.0.1", 2, 1_010).await);
        assert!(!limiter.admit("10.0.0.1", 2, 1_020).await);
        // 60 seconds after the window started, the counter resets.
        assert!(limiter.admit("10.0.0.1", 2, 1_065).await);
    }

    #[tokio::test]
    async fn test_rejected_hits_still_count() {
        let limiter = limiter();
        limiter.admit("10.0.0.1", 1, 1_000).await;
        limiter.admit("10.0.0.1", 1, 1_010).await;
        limiter.admit("10.0.0.1", 1, 1_020).await;
        let snapshot = limiter.store.snapshot().await;
        assert_eq!(snapshot[&counter_key("10.0.0.1")].count, 3);
    }

    #[tokio::test]
    async fn test_zero_limit_rejects_everything() {
        let limiter = limiter();
        assert!(!limiter.admit("10.0.0.1", 0, 1_000).await);
        assert!(!limiter.admit("10.0.0.1", 0, 1_070).await);
    }

    #[tokio::test]
    async fn test_distinct_ips_have_separate_budgets() {
        let limiter = limiter();
        assert!(limiter.admit("10.0.0.1", 1, 1_000).await);
        assert!(limiter.admit("10.0.0.2", 1, 1_000).await);
        assert!(!limiter.admit("10.0.0.1", 1, 1_010).await);
    }

    #[tokio::test]
    async fn test_concurrent_hits_deny_exactly_overflow() {
        let limiter = Arc::new(limiter());
        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..20 {
            let limiter = Arc::clone(&limiter);
            tasks.spawn(async move { limiter.admit("10.0.0.1", 15, 1_000).await });
        }

        let mut denied = 0;
        while let Some(result) = tasks.join_next().await {
            if !result.unwrap() {
                denied += 1;
            }
        }
        assert_eq!(denied, 5);
        assert_eq!(
            limiter.store.snapshot().await[&counter_key("10.0.0.1")].count,
            20
        );
    }
}
