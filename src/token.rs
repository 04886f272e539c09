//! Shared-secret token generation and verification.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Alphabet tokens are drawn from.
const CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Default token length for auto-provisioned tokens.
pub const DEFAULT_LENGTH: usize = 32;

/// Generate a random token of the given length, drawn uniformly from
/// `[0-9a-zA-Z]`.
///
/// `ThreadRng` is a cryptographically secure source, so generated tokens are
/// safe to use as shared secrets.
pub fn generate(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Check a presented token against the configured token.
///
/// The SHA-256 digests are compared instead of the raw strings, so the cost
/// of the comparison does not depend on where the first mismatching byte
/// falls.
pub fn verify(presented: &str, expected: &str) -> bool {
    Sha256::digest(presented.as_bytes()) == Sha256::digest(expected.as_bytes())
}
