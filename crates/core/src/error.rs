//! Unified error types for the webshot cache layer.

use std::path::PathBuf;

/// Unified error types for cache backends and their initialization.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Filesystem operation failed on the local store.
    #[error("cache I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configured cache root exists but is not a directory.
    #[error("cache path {0} exists, but is not a directory")]
    NotADirectory(PathBuf),

    /// S3 request failed.
    #[error("s3 error: {0}")]
    S3(String),

    /// Target bucket does not exist and could not be created.
    #[error("bucket {0} not found and could not be created")]
    BucketUnavailable(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotADirectory(PathBuf::from("/tmp/webshot"));
        assert!(err.to_string().contains("/tmp/webshot"));
        assert!(err.to_string().contains("not a directory"));
    }
}
