//! Admission-control orchestration.

use std::sync::Arc;

use tracing::debug;

use crate::audit::AuditSink;
use crate::config::ProtectionConfig;
use crate::ratelimit::RateLimiter;
use crate::token;

use super::decision::{Decision, DenyReason};

/// Runs the admission checks for one inbound request, in fixed order:
/// token, whitelist, rate limit. The first failure wins and is recorded to
/// the audit sink; allowed requests are not logged.
pub struct AccessGate {
    limiter: RateLimiter,
    audit: Arc<dyn AuditSink>,
}

impl AccessGate {
    /// Create a gate over the given limiter and audit sink.
    pub fn new(limiter: RateLimiter, audit: Arc<dyn AuditSink>) -> Self {
        Self { limiter, audit }
    }

    /// Evaluate one request.
    pub async fn evaluate(
        &self,
        ip: &str,
        presented_token: &str,
        config: &ProtectionConfig,
        now: i64,
    ) -> Decision {
        if !token::verify(presented_token, &config.token) {
            return self.deny(ip, DenyReason::InvalidToken, now);
        }

        let whitelist = config.whitelist_entries();
        if !whitelist.is_empty() && !whitelist.iter().any(|entry| entry == ip) {
            return self.deny(ip, DenyReason::NotWhitelisted, now);
        }

        if !self.limiter.admit(ip, config.limit_per_minute, now).await {
            return self.deny(ip, DenyReason::RateLimited, now);
        }

        debug!(ip, "Request admitted");
        Decision::Allow
    }

    fn deny(&self, ip: &str, reason: DenyReason, now: i64) -> Decision {
        debug!(ip, reason = %reason, "Request denied");
        self.audit.record(ip, reason, now);
        Decision::Deny(reason)
    }
}
