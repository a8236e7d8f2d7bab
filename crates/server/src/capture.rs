//! The cache coordinator: one request flow from fingerprint to response.
//!
//! Per request: Validate -> Fingerprint -> (force? skip lookup) -> Lookup ->
//! Hit | Miss -> (Miss: Render -> Store) -> Respond. Concurrent requests for
//! the same fingerprint are not coalesced; both may render redundantly, which
//! is accepted over holding per-key state.

use std::sync::Arc;

use webshot_core::CaptureRequest;
use webshot_core::cache::CacheStore;
use webshot_core::cache::fingerprint::fingerprint;
use webshot_render::{RenderError, Renderer};

/// Failures surfaced to the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The request carried no target URL. Rejected before any fingerprint
    /// is computed.
    #[error("query parameter missing, try adding url parameter (other parameters are width, height, scale, quality, wait, and timeout)")]
    MissingUrl,

    /// Cache lookup hit a real I/O failure (not a miss).
    #[error("cache error: {0}")]
    Cache(#[from] webshot_core::Error),

    /// The render collaborator failed or timed out. Never retried here.
    #[error("error occurred while creating screenshot: {0}")]
    Render(#[from] RenderError),
}

/// A served screenshot and where it came from.
pub struct CaptureOutcome {
    pub image: Vec<u8>,
    pub cache_hit: bool,
}

/// Ties fingerprinting, cache lookup and the render collaborator together.
pub struct Coordinator {
    store: Arc<dyn CacheStore>,
    renderer: Arc<dyn Renderer>,
}

impl Coordinator {
    pub fn new(store: Arc<dyn CacheStore>, renderer: Arc<dyn Renderer>) -> Self {
        Self { store, renderer }
    }

    /// Serve one capture request, from cache when possible.
    pub async fn handle(&self, request: &CaptureRequest) -> Result<CaptureOutcome, CaptureError> {
        if request.url.is_empty() {
            return Err(CaptureError::MissingUrl);
        }

        let key = fingerprint(&request.url, request.width, request.height, request.scale);

        if request.force {
            tracing::debug!(key, url = %request.url, "force flag set, bypassing cache lookup");
        } else if let Some(image) = self.store.get(&key, request.max_age_secs).await? {
            tracing::info!(key, url = %request.url, "serving cached screenshot");
            return Ok(CaptureOutcome { image, cache_hit: true });
        }

        tracing::info!(key, url = %request.url, "rendering screenshot");
        let image = self.renderer.capture(request).await?;

        // Availability over cache consistency: a failed save is logged and
        // the freshly rendered bytes are still returned.
        if let Err(e) = self.store.save(&key, &image).await {
            tracing::warn!(key, error = %e, "failed to store rendered screenshot");
        }

        Ok(CaptureOutcome { image, cache_hit: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use webshot_core::cache::LocalStore;
    use webshot_core::config::CaptureDefaults;

    struct MockRenderer {
        calls: AtomicUsize,
        result: Result<Vec<u8>, ()>,
    }

    impl MockRenderer {
        fn returning(image: &[u8]) -> Self {
            Self { calls: AtomicUsize::new(0), result: Ok(image.to_vec()) }
        }

        fn failing() -> Self {
            Self { calls: AtomicUsize::new(0), result: Err(()) }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl Renderer for MockRenderer {
        async fn capture(&self, _request: &CaptureRequest) -> Result<Vec<u8>, RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .clone()
                .map_err(|()| RenderError::Navigation("mock failure".into()))
        }
    }

    struct BrokenStore;

    #[async_trait::async_trait]
    impl CacheStore for BrokenStore {
        async fn save(&self, _key: &str, _data: &[u8]) -> Result<(), webshot_core::Error> {
            Err(webshot_core::Error::S3("save unavailable".into()))
        }

        async fn get(&self, _key: &str, _max_age_secs: u64) -> Result<Option<Vec<u8>>, webshot_core::Error> {
            Err(webshot_core::Error::S3("get unavailable".into()))
        }

        async fn delete(&self, _key: &str) -> Result<(), webshot_core::Error> {
            Ok(())
        }

        async fn run_cleanup(&self, _max_age_secs: u64) {}
    }

    fn request(url: &str) -> CaptureRequest {
        CaptureRequest::with_defaults(url, &CaptureDefaults::default())
    }

    async fn local_store(dir: &tempfile::TempDir) -> Arc<LocalStore> {
        Arc::new(LocalStore::open(dir.path().join("cache")).await.unwrap())
    }

    #[tokio::test]
    async fn test_miss_renders_and_stores() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_store(&dir).await;
        let renderer = Arc::new(MockRenderer::returning(b"fresh image"));
        let coordinator = Coordinator::new(store.clone(), renderer.clone());

        let request = request("https://example.com");
        let outcome = coordinator.handle(&request).await.unwrap();

        assert_eq!(outcome.image, b"fresh image");
        assert!(!outcome.cache_hit);
        assert_eq!(renderer.calls(), 1);

        let key = fingerprint(&request.url, request.width, request.height, request.scale);
        assert_eq!(store.get(&key, 0).await.unwrap().as_deref(), Some(b"fresh image".as_slice()));
    }

    #[tokio::test]
    async fn test_repeat_request_hits_without_render() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_store(&dir).await;
        let renderer = Arc::new(MockRenderer::returning(b"image"));
        let coordinator = Coordinator::new(store, renderer.clone());

        let request = request("https://example.com");
        coordinator.handle(&request).await.unwrap();
        let outcome = coordinator.handle(&request).await.unwrap();

        assert_eq!(outcome.image, b"image");
        assert!(outcome.cache_hit);
        assert_eq!(renderer.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_url_rejected_before_render() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_store(&dir).await;
        let renderer = Arc::new(MockRenderer::returning(b"image"));
        let coordinator = Coordinator::new(store, renderer.clone());

        let result = coordinator.handle(&request("")).await;

        assert!(matches!(result, Err(CaptureError::MissingUrl)));
        assert_eq!(renderer.calls(), 0);
    }

    #[tokio::test]
    async fn test_render_failure_stores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_store(&dir).await;
        let renderer = Arc::new(MockRenderer::failing());
        let coordinator = Coordinator::new(store.clone(), renderer.clone());

        let request = request("https://example.com");
        let result = coordinator.handle(&request).await;
        assert!(matches!(result, Err(CaptureError::Render(_))));

        // the next identical request still misses and renders again
        let result = coordinator.handle(&request).await;
        assert!(matches!(result, Err(CaptureError::Render(_))));
        assert_eq!(renderer.calls(), 2);

        let key = fingerprint(&request.url, request.width, request.height, request.scale);
        assert!(store.get(&key, 0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_force_bypasses_fresh_entry_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_store(&dir).await;
        let renderer = Arc::new(MockRenderer::returning(b"rerendered"));
        let coordinator = Coordinator::new(store.clone(), renderer.clone());

        let mut request = request("https://example.com");
        let key = fingerprint(&request.url, request.width, request.height, request.scale);
        store.save(&key, b"cached").await.unwrap();

        request.force = true;
        let outcome = coordinator.handle(&request).await.unwrap();

        assert_eq!(outcome.image, b"rerendered");
        assert!(!outcome.cache_hit);
        assert_eq!(renderer.calls(), 1);
        assert_eq!(store.get(&key, 0).await.unwrap().as_deref(), Some(b"rerendered".as_slice()));
    }

    #[tokio::test]
    async fn test_lookup_io_error_is_not_a_miss() {
        let renderer = Arc::new(MockRenderer::returning(b"image"));
        let coordinator = Coordinator::new(Arc::new(BrokenStore), renderer.clone());

        let result = coordinator.handle(&request("https://example.com")).await;

        assert!(matches!(result, Err(CaptureError::Cache(_))));
        assert_eq!(renderer.calls(), 0);
    }

    #[tokio::test]
    async fn test_save_failure_still_returns_image() {
        let renderer = Arc::new(MockRenderer::returning(b"image"));
        let mut request = request("https://example.com");
        // force skips the broken lookup, exercising only the broken save
        request.force = true;

        let coordinator = Coordinator::new(Arc::new(BrokenStore), renderer);
        let outcome = coordinator.handle(&request).await.unwrap();
        assert_eq!(outcome.image, b"image");
    }
}
