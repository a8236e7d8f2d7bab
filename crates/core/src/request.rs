//! The capture request descriptor shared by the server and the renderer.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::CaptureDefaults;

/// A fully resolved screenshot request.
///
/// All numeric fields are already validated against the parse-or-default rule
/// by the time a value of this type exists: width, height, quality, wait and
/// timeout are positive, scale is a positive float, and max_age is
/// non-negative with zero meaning "never expire".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureRequest {
    /// Target page URL.
    pub url: String,

    /// Viewport width in pixels.
    pub width: u32,

    /// Viewport height in pixels.
    pub height: u32,

    /// Scale applied to the captured image (0.2 turns 1920x1024 into 384x204).
    pub scale: f64,

    /// Image quality passed to the capture call.
    pub quality: u32,

    /// Fixed delay before capturing, in milliseconds. Only meaningful when
    /// `wait_for_idle` is false.
    pub wait_ms: u64,

    /// Wait for the page's load lifecycle instead of a fixed delay.
    pub wait_for_idle: bool,

    /// Overall capture deadline in milliseconds.
    pub timeout_ms: u64,

    /// Maximum cache entry age in seconds; zero disables expiration.
    pub max_age_secs: u64,

    /// Skip the cache lookup and re-render, still updating the cache after.
    pub force: bool,
}

impl CaptureRequest {
    /// Build a request for `url` with every other field at its configured default.
    pub fn with_defaults(url: impl Into<String>, defaults: &CaptureDefaults) -> Self {
        Self {
            url: url.into(),
            width: defaults.width,
            height: defaults.height,
            scale: defaults.scale,
            quality: defaults.quality,
            wait_ms: defaults.wait_ms,
            wait_for_idle: false,
            timeout_ms: defaults.timeout_ms,
            max_age_secs: defaults.max_age_secs,
            force: false,
        }
    }

    /// Capture deadline as a Duration for use with tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Pre-capture delay as a Duration.
    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }
}
