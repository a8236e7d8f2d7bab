//! Local filesystem cache backend with directory sharding.
//!
//! Entries live at `<root>/<k0>/<k1>/<k2>/<key>.png`. Staleness is judged by
//! file modification time at lookup, and a background sweep walks the whole
//! shard tree. Writes go to a temporary file in the destination shard
//! directory and are renamed into place, so a concurrent reader never
//! observes a half-written entry.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use walkdir::WalkDir;

use super::{CacheStore, sharded_path};
use crate::Error;

/// Monotonic suffix keeping concurrent temp files for the same key apart.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Filesystem-backed cache store.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open the store rooted at `path`, creating the directory tree if needed.
    ///
    /// The path is resolved to an absolute one first. Failure here (the path
    /// exists as a regular file, or the tree cannot be created) is fatal to
    /// startup, not a request-time condition.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let root = std::path::absolute(path.as_ref()).map_err(|e| Error::io(path.as_ref(), e))?;

        match tokio::fs::metadata(&root).await {
            Ok(meta) if !meta.is_dir() => return Err(Error::NotADirectory(root)),
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(Error::io(&root, e)),
        }

        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| Error::io(&root, e))?;

        Ok(Self { root })
    }

    /// Absolute path of the entry for `key`.
    fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(sharded_path(key))
    }
}

#[async_trait::async_trait]
impl CacheStore for LocalStore {
    async fn save(&self, key: &str, data: &[u8]) -> Result<(), Error> {
        let path = self.entry_path(key);
        let Some(dir) = path.parent() else {
            return Err(Error::io(&path, ErrorKind::InvalidInput.into()));
        };

        tokio::fs::create_dir_all(dir).await.map_err(|e| Error::io(dir, e))?;

        // Write-then-rename keeps partial writes out of the readable path;
        // rename is atomic because the temp file shares the shard directory.
        let tmp = dir.join(format!(
            ".{key}.{}.{}.tmp",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(e) = tokio::fs::write(&tmp, data).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Error::io(&tmp, e));
        }

        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Error::io(&path, e));
        }

        tracing::debug!(key, path = %path.display(), bytes = data.len(), "cache entry written");
        Ok(())
    }

    async fn get(&self, key: &str, max_age_secs: u64) -> Result<Option<Vec<u8>>, Error> {
        let path = self.entry_path(key);

        let meta = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io(&path, e)),
        };

        if max_age_secs > 0 {
            let modified = meta.modified().map_err(|e| Error::io(&path, e))?;
            let age = SystemTime::now().duration_since(modified).unwrap_or_default();
            if age > Duration::from_secs(max_age_secs) {
                tracing::debug!(key, age_secs = age.as_secs(), "stale cache entry, purging");
                // A stale-but-undeletable file must never be served, so the
                // deletion outcome does not change the miss.
                if let Err(e) = self.delete(key).await {
                    tracing::warn!(key, error = %e, "failed to purge stale cache entry");
                }
                return Ok(None);
            }
        }

        match tokio::fs::read(&path).await {
            Ok(data) => {
                tracing::debug!(key, bytes = data.len(), "cache hit");
                Ok(Some(data))
            }
            // Deleted between the stat and the read; still just a miss.
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(&path, e)),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        let path = self.entry_path(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(&path, e)),
        }
    }

    async fn run_cleanup(&self, max_age_secs: u64) {
        if max_age_secs == 0 {
            return;
        }
        let Some(cutoff) = SystemTime::now().checked_sub(Duration::from_secs(max_age_secs)) else {
            return;
        };

        let root = self.root.clone();
        let swept = tokio::task::spawn_blocking(move || {
            let mut removed = 0u64;
            let mut failed = 0u64;

            for entry in WalkDir::new(&root) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        tracing::warn!(error = %e, "cleanup: cannot walk cache directory entry");
                        failed += 1;
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }

                let modified = match entry.metadata().map(|meta| meta.modified()) {
                    Ok(Ok(modified)) => modified,
                    Ok(Err(_)) | Err(_) => {
                        failed += 1;
                        continue;
                    }
                };
                if modified >= cutoff {
                    continue;
                }

                match std::fs::remove_file(entry.path()) {
                    Ok(()) => removed += 1,
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => {
                        tracing::warn!(path = %entry.path().display(), error = %e, "cleanup: cannot remove stale entry");
                        failed += 1;
                    }
                }
            }

            (removed, failed)
        })
        .await;

        match swept {
            Ok((removed, failed)) => {
                tracing::info!(removed, failed, root = %self.root.display(), "cache cleanup sweep finished");
            }
            Err(e) => tracing::warn!(error = %e, "cache cleanup task failed"),
        }
    }
}
