//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (WEBSHOT_*)
//! 2. TOML config file (if WEBSHOT_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Per-request capture defaults, applied wherever a query parameter is
/// missing or fails the parse-or-default rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureDefaults {
    /// Viewport width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Viewport height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,

    /// Output scale factor.
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// Capture quality.
    #[serde(default = "default_quality")]
    pub quality: u32,

    /// Delay before capturing, in milliseconds.
    #[serde(default = "default_wait_ms")]
    pub wait_ms: u64,

    /// Capture deadline in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Cache entry lifetime in seconds; zero means entries never expire.
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
}

fn default_width() -> u32 {
    1920
}

fn default_height() -> u32 {
    1024
}

fn default_scale() -> f64 {
    0.2
}

fn default_quality() -> u32 {
    90
}

fn default_wait_ms() -> u64 {
    2_000
}

fn default_timeout_ms() -> u64 {
    60_000
}

fn default_max_age_secs() -> u64 {
    2_592_000 // 30 days
}

impl Default for CaptureDefaults {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            scale: default_scale(),
            quality: default_quality(),
            wait_ms: default_wait_ms(),
            timeout_ms: default_timeout_ms(),
            max_age_secs: default_max_age_secs(),
        }
    }
}

/// Which cache backend to run. A startup-time decision, never per-request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    Local,
    S3,
}

/// Local filesystem backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalCacheConfig {
    /// Cache root directory.
    ///
    /// Set via WEBSHOT_CACHE__LOCAL__PATH environment variable.
    #[serde(default = "default_local_path")]
    pub path: PathBuf,
}

fn default_local_path() -> PathBuf {
    std::env::temp_dir().join("webshot")
}

impl Default for LocalCacheConfig {
    fn default() -> Self {
        Self { path: default_local_path() }
    }
}

/// S3 backend settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3CacheConfig {
    /// Custom endpoint for S3-compatible stores (MinIO etc.).
    ///
    /// Set via WEBSHOT_CACHE__S3__ENDPOINT; empty uses the AWS default.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bucket region.
    #[serde(default)]
    pub region: Option<String>,

    /// Target bucket name. Required when the s3 backend is selected.
    #[serde(default)]
    pub bucket: String,

    /// Static access key; falls back to the ambient AWS credential chain
    /// when unset.
    #[serde(default)]
    pub access_key: Option<String>,

    /// Static secret key, paired with `access_key`.
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Create the bucket at startup if it does not exist.
    #[serde(default)]
    pub create_bucket: bool,
}

/// Cache backend selection and shared cache policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Active backend.
    #[serde(default = "default_backend")]
    pub backend: CacheBackendKind,

    /// Interval between background cleanup sweeps, in seconds. Zero disables
    /// the sweep entirely.
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,

    /// Local backend settings.
    #[serde(default)]
    pub local: LocalCacheConfig,

    /// S3 backend settings.
    #[serde(default)]
    pub s3: S3CacheConfig,
}

fn default_backend() -> CacheBackendKind {
    CacheBackendKind::Local
}

fn default_cleanup_interval_secs() -> u64 {
    2_592_000 // 30 days
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            local: LocalCacheConfig::default(),
            s3: S3CacheConfig::default(),
        }
    }
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (WEBSHOT_*)
/// 2. TOML config file (if WEBSHOT_CONFIG_FILE set)
/// 3. Built-in defaults
///
/// Built once at startup and passed by reference afterwards; nothing mutates
/// it while requests are in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Listen address for the HTTP server.
    ///
    /// Set via WEBSHOT_LISTEN environment variable.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Verbose logging toggle.
    ///
    /// Set via WEBSHOT_DEBUG environment variable.
    #[serde(default)]
    pub debug: bool,

    /// Per-request capture defaults.
    #[serde(default)]
    pub defaults: CaptureDefaults,

    /// Cache backend selection and policy.
    #[serde(default)]
    pub cache: CacheConfig,
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            debug: false,
            defaults: CaptureDefaults::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl AppConfig {
    /// Cleanup sweep interval as a Duration.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cache.cleanup_interval_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `WEBSHOT_`
    /// 2. TOML file from `WEBSHOT_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("WEBSHOT_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("WEBSHOT_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
