//! Deterministic cache key derivation for capture requests.

use sha2::{Digest, Sha256};

/// Compute the cache fingerprint for a capture request.
///
/// Only the inputs that change the rendered image participate: the target
/// URL, the viewport dimensions, and the output scale. Quality, waits,
/// timeouts and cache policy do not, so varying those on an otherwise
/// identical request reuses the same cache slot.
///
/// Pure and stable across process restarts; used as an opaque
/// content-addressing key, not as a security primitive.
pub fn fingerprint(url: &str, width: u32, height: u32, scale: f64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(b"\n");
    hasher.update(height.to_string().as_bytes());
    hasher.update(b"x");
    hasher.update(width.to_string().as_bytes());
    hasher.update(b"\n");
    hasher.update(scale.to_bits().to_le_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_stability() {
        let hash1 = fingerprint("https://example.com", 1920, 1024, 0.2);
        let hash2 = fingerprint("https://example.com", 1920, 1024, 0.2);
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_fingerprint_different_url() {
        let hash1 = fingerprint("https://example.com", 1920, 1024, 0.2);
        let hash2 = fingerprint("https://example.org", 1920, 1024, 0.2);
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_fingerprint_different_dimensions() {
        let base = fingerprint("https://example.com", 1920, 1024, 0.2);
        assert_ne!(base, fingerprint("https://example.com", 1280, 1024, 0.2));
        assert_ne!(base, fingerprint("https://example.com", 1920, 720, 0.2));
        // swapped width/height must not collide
        assert_ne!(
            fingerprint("https://example.com", 1024, 1920, 0.2),
            fingerprint("https://example.com", 1920, 1024, 0.2)
        );
    }

    #[test]
    fn test_fingerprint_different_scale() {
        let hash1 = fingerprint("https://example.com", 1920, 1024, 0.2);
        let hash2 = fingerprint("https://example.com", 1920, 1024, 0.5);
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_fingerprint_format() {
        let hash = fingerprint("https://example.com", 1920, 1024, 0.2);
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
