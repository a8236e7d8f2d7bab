//! Fingerprint-addressed cache backends for rendered screenshots.
//!
//! The cache stores opaque PNG payloads keyed by request fingerprint. Two
//! backends implement the same capability surface:
//!
//! - [`LocalStore`]: sharded files under a root directory, with mtime-based
//!   staleness checks and a walk-the-tree cleanup sweep
//! - [`S3Store`]: objects in a bucket whose expiration is delegated to a
//!   bucket lifecycle rule

pub mod cleanup;
pub mod fingerprint;
pub mod local;
pub mod s3;

pub use crate::Error;

pub use local::LocalStore;
pub use s3::S3Store;

/// Capability surface every cache backend provides.
///
/// Keys are fingerprints as produced by [`fingerprint::fingerprint`].
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Persist `data` under `key`, overwriting any prior value.
    ///
    /// Safe to call concurrently for distinct keys; concurrent writes to the
    /// same key are last-writer-wins.
    async fn save(&self, key: &str, data: &[u8]) -> Result<(), Error>;

    /// Fetch the payload for `key` if present and not stale.
    ///
    /// `Ok(None)` is a cache miss, including the case where a stored copy
    /// was found to be expired (the stale entry is purged on the way out).
    /// `max_age_secs == 0` disables expiration for this lookup. Only real
    /// I/O failures are errors; staleness never is.
    ///
    /// The S3 backend ignores `max_age_secs`: once expiration is delegated
    /// to the bucket lifecycle rule, that rule is the single source of truth.
    async fn get(&self, key: &str, max_age_secs: u64) -> Result<Option<Vec<u8>>, Error>;

    /// Remove the entry for `key`. Deleting an absent entry is not an error.
    async fn delete(&self, key: &str) -> Result<(), Error>;

    /// Best-effort sweep purging entries older than `max_age_secs`.
    ///
    /// Possibly long-running; invoked from the background scheduler, never
    /// from request handling. Partial failure is logged, not surfaced.
    async fn run_cleanup(&self, max_age_secs: u64);
}

/// File extension for stored entries.
pub(crate) const ENTRY_EXT: &str = "png";

/// Relative sharded path for a key: `<k0>/<k1>/<k2>/<key>.png`.
///
/// One directory level per leading fingerprint character bounds per-directory
/// fan-out on the local store; the S3 backend reuses the same layout for
/// naming consistency.
pub(crate) fn sharded_path(key: &str) -> String {
    let mut chars = key.chars();
    let (a, b, c) = (chars.next(), chars.next(), chars.next());
    match (a, b, c) {
        (Some(a), Some(b), Some(c)) => format!("{a}/{b}/{c}/{key}.{ENTRY_EXT}"),
        // Fingerprints are always 64 hex chars; anything shorter is only
        // reachable from tests poking at the trait directly.
        _ => format!("{key}.{ENTRY_EXT}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sharded_path_layout() {
        assert_eq!(sharded_path("abcdef"), "a/b/c/abcdef.png");
    }

    #[test]
    fn test_sharded_path_short_key() {
        assert_eq!(sharded_path("ab"), "ab.png");
    }
}
