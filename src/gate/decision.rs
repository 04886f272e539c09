//! Admission decision types.

/// The verdict produced for one inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Forward the request to the real XML-RPC handler.
    Allow,
    /// Reject the request with the given reason.
    Deny(DenyReason),
}

impl Decision {
    /// Whether this decision permits the request.
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Reason a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The presented token did not match the configured token.
    InvalidToken,
    /// A whitelist is configured and the client IP is not on it.
    NotWhitelisted,
    /// The client IP exceeded its per-minute request budget.
    RateLimited,
}

impl DenyReason {
    /// Stable status code used in the audit log.
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::InvalidToken => "INVALID_TOKEN",
            DenyReason::NotWhitelisted => "NOT_IN_WHITELIST",
            DenyReason::RateLimited => "RATE_LIMIT_EXCEEDED",
        }
    }

    /// User-facing message for the rejection response.
    pub fn message(&self) -> &'static str {
        match self {
            DenyReason::InvalidToken => "Invalid XML-RPC endpoint",
            DenyReason::NotWhitelisted => "Access denied: IP not allowed",
            DenyReason::RateLimited => "Too many XML-RPC requests, try later",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_is_allow() {
        assert!(Decision::Allow.is_allow());
        assert!(!Decision::Deny(DenyReason::InvalidToken).is_allow());
    }

    #[test]
    fn test_deny_reason_codes() {
        assert_eq!(DenyReason::InvalidToken.code(), "INVALID_TOKEN");
        assert_eq!(DenyReason::NotWhitelisted.code(), "NOT_IN_WHITELIST");
        assert_eq!(DenyReason::RateLimited.code(), "RATE_LIMIT_EXCEEDED");
    }

    #[test]
    fn test_deny_reason_display_matches_code() {
        assert_eq!(DenyReason::RateLimited.to_string(), "RATE_LIMIT_EXCEEDED");
    }
}
