//! Entry key generation for normalized requests.

use sha2::{Digest, Sha256};

/// Compute the entry key for a normalized request.
///
/// Keys are vary-insensitive: method and URL alone identify an entry.
pub fn compute_entry_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
