//! Client identity resolution.
//!
//! Resolves the caller IP from proxy headers, falling back to the direct
//! connection address. Pure functions, no state.

use std::net::IpAddr;

/// Address reported when neither a forwarded header nor a peer address is
/// available.
pub const FALLBACK_IP: &str = "0.0.0.0";

/// Resolve the client IP for an inbound request.
///
/// Prefers the first entry of an `X-Forwarded-For` header, then the direct
/// peer address, then [`FALLBACK_IP`].
pub fn client_ip(forwarded_for: Option<&str>, peer_addr: Option<IpAddr>) -> String {
    if let Some(header) = forwarded_for {
        if let Some(first) = header.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    match peer_addr {
        Some(addr) => addr.to_string(),
        None => FALLBACK_IP.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn peer() -> Option<IpAddr> {
        Some(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10)))
    }

    #[test]
    fn test_forwarded_for_first_entry_wins() {
        let ip = client_ip(Some("10.0.0.1, 172.16.0.1"), peer());
        assert_eq!(ip, "10.0.0.1");
    }

    #[test]
    fn test_forwarded_for_entries_are_trimmed() {
        let ip = client_ip(Some("  10.0.0.1 ,172.16.0.1"), peer());
        assert_eq!(ip, "10.0.0.1");
    }

    #[test]
    fn test_empty_forwarded_for_falls_back_to_peer() {
        let ip = client_ip(Some("   "), peer());
        assert_eq!(ip, "192.168.1.10");
    }

    #[test]
    fn test_peer_address_fallback() {
        let ip = client_ip(None, peer());
        assert_eq!(ip, "192.168.1.10");
    }

    #[test]
    fn test_default_when_nothing_available() {
        assert_eq!(client_ip(None, None), FALLBACK_IP);
    }
}
