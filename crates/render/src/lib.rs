//! Headless browser screenshot capture for webshot.
//!
//! This crate provides the render collaborator the cache coordinator
//! delegates to: a `Renderer` trait plus a feature-gated implementation
//! using chromiumoxide for headless Chrome/Chromium browser control.

use thiserror::Error;
use webshot_core::CaptureRequest;

/// Errors that can occur while rendering a screenshot.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Failed to launch or connect to browser.
    #[error("browser launch failed: {0}")]
    BrowserLaunch(String),

    /// Failed to navigate to URL.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Failed to apply the viewport emulation override.
    #[error("viewport emulation failed: {0}")]
    Emulation(String),

    /// Failed to capture the screenshot.
    #[error("screenshot capture failed: {0}")]
    Capture(String),

    /// Timeout waiting for the page to render.
    #[error("render timeout after {0}ms")]
    Timeout(u64),
}

/// Renderer trait for producing image bytes from a capture request.
#[async_trait::async_trait]
pub trait Renderer: Send + Sync {
    /// Render the page described by `request` to PNG bytes.
    ///
    /// Runs under the request's own timeout; a timeout is reported as a
    /// failure like any other, never as partial output.
    async fn capture(&self, request: &CaptureRequest) -> Result<Vec<u8>, RenderError>;
}

/// Headless Chrome/Chromium screenshotter using chromiumoxide.
#[cfg(feature = "render")]
pub struct HeadlessCapturer {
    browser: chromiumoxide::Browser,
}

#[cfg(feature = "render")]
impl HeadlessCapturer {
    /// Create a new capturer by launching a browser instance.
    ///
    /// The browser runs in headless mode and uses a background task
    /// to handle Chrome DevTools Protocol events.
    pub async fn new() -> Result<Self, RenderError> {
        use chromiumoxide::browser::{Browser, BrowserConfig};
        use futures_util::StreamExt;

        let (browser, mut handler) =
            Browser::launch(BrowserConfig::builder().build().map_err(RenderError::BrowserLaunch)?)
                .await
                .map_err(|e| RenderError::BrowserLaunch(e.to_string()))?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser handler event error: {e}");
                    break;
                }
            }
        });

        Ok(Self { browser })
    }

    async fn capture_inner(&self, request: &CaptureRequest) -> Result<Vec<u8>, RenderError> {
        use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
        use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, Viewport};
        use chromiumoxide::page::ScreenshotParams;

        let page = self
            .browser
            .new_page(request.url.as_str())
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;

        let metrics = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(request.width))
            .height(i64::from(request.height))
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(RenderError::Emulation)?;
        page.execute(metrics)
            .await
            .map_err(|e| RenderError::Emulation(e.to_string()))?;

        if request.wait_for_idle {
            page.wait_for_navigation()
                .await
                .map_err(|e| RenderError::Navigation(e.to_string()))?;
        } else {
            tokio::time::sleep(request.wait()).await;
        }

        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .quality(i64::from(request.quality))
            .clip(Viewport {
                x: 0.0,
                y: 0.0,
                width: f64::from(request.width),
                height: f64::from(request.height),
                scale: request.scale,
            })
            .full_page(false)
            .build();

        let image = page
            .screenshot(params)
            .await
            .map_err(|e| RenderError::Capture(e.to_string()))?;

        page.close().await.ok();
        Ok(image)
    }
}

#[cfg(feature = "render")]
#[async_trait::async_trait]
impl Renderer for HeadlessCapturer {
    async fn capture(&self, request: &CaptureRequest) -> Result<Vec<u8>, RenderError> {
        tokio::time::timeout(request.timeout(), self.capture_inner(request))
            .await
            .map_err(|_| RenderError::Timeout(request.timeout_ms))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_error_display() {
        let err = RenderError::Timeout(60_000);
        assert_eq!(err.to_string(), "render timeout after 60000ms");
    }

    #[cfg(feature = "render")]
    #[tokio::test]
    #[ignore = "requires Chrome/Chromium installation"]
    async fn test_headless_capture() {
        use webshot_core::config::CaptureDefaults;

        let capturer = HeadlessCapturer::new().await.unwrap();
        let request = CaptureRequest::with_defaults("https://example.com", &CaptureDefaults::default());

        let image = capturer.capture(&request).await.unwrap();
        assert!(!image.is_empty());
        // PNG signature
        assert_eq!(&image[..8], &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
    }
}
