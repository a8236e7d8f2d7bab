//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::{AppConfig, CacheBackendKind};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - any capture default that must be positive is 0 (width, height,
    ///   quality, wait_ms, timeout_ms) or scale is not a positive number
    /// - `listen` is empty
    ///
    /// Returns `ConfigError::Missing` if the s3 backend is selected without
    /// a bucket name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen.is_empty() {
            return Err(ConfigError::Invalid { field: "listen".into(), reason: "must not be empty".into() });
        }

        for (field, value) in [
            ("defaults.width", u64::from(self.defaults.width)),
            ("defaults.height", u64::from(self.defaults.height)),
            ("defaults.quality", u64::from(self.defaults.quality)),
            ("defaults.wait_ms", self.defaults.wait_ms),
            ("defaults.timeout_ms", self.defaults.timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must be greater than 0".into() });
            }
        }

        if self.defaults.scale <= 0.0 || !self.defaults.scale.is_finite() {
            return Err(ConfigError::Invalid {
                field: "defaults.scale".into(),
                reason: "must be a positive number".into(),
            });
        }

        if self.cache.backend == CacheBackendKind::S3 && self.cache.s3.bucket.is_empty() {
            return Err(ConfigError::Missing {
                field: "cache.s3.bucket".into(),
                hint: "Set WEBSHOT_CACHE__S3__BUCKET environment variable".into(),
            });
        }

        if self.cache.backend == CacheBackendKind::S3 && self.defaults.max_age_secs > 0 && self.defaults.max_age_secs < 86_400 {
            tracing::warn!(
                max_age_secs = self.defaults.max_age_secs,
                "S3 lifecycle expiration is day-granular; a max age below one day \
                 rounds down to no managed expiration"
            );
        }

        Ok(())
    }
}
