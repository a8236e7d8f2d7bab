//! webshot server entry point.
//!
//! Boots the HTTP server: loads configuration, initializes the selected
//! cache backend and the headless renderer, starts the background cleanup
//! task, and serves. Backend or renderer initialization failures abort
//! startup; once serving, every error is scoped to its own request.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

mod capture;
mod error;
mod http;
mod query;

/// Default log filter when RUST_LOG is unset.
///
/// The debug toggle must surface the cache layer's hit/miss/purge events,
/// which log under the `webshot_core` target, not just the binary's own
/// `webshot` target.
fn default_filter(debug: bool) -> &'static str {
    if debug { "webshot=debug,webshot_core=debug,webshot_render=debug,info" } else { "info" }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = webshot_core::AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(config.debug))),
        )
        .init();

    #[cfg(not(feature = "render"))]
    anyhow::bail!("this build has no renderer; rebuild with the `render` feature enabled");

    #[cfg(feature = "render")]
    run(config).await
}

#[cfg(feature = "render")]
async fn run(config: webshot_core::AppConfig) -> Result<()> {
    use std::sync::Arc;
    use webshot_core::cache::{CacheStore, LocalStore, S3Store, cleanup};
    use webshot_core::config::CacheBackendKind;
    use webshot_render::{HeadlessCapturer, Renderer};

    tracing::debug!(defaults = ?config.defaults, "effective capture defaults");

    let store: Arc<dyn CacheStore> = match config.cache.backend {
        CacheBackendKind::Local => {
            let store = LocalStore::open(&config.cache.local.path).await?;
            tracing::info!(path = %config.cache.local.path.display(), "cache backend: local");
            Arc::new(store)
        }
        CacheBackendKind::S3 => {
            let retention_days = config.defaults.max_age_secs / 86_400;
            let store = S3Store::open(&config.cache.s3, retention_days).await?;
            tracing::info!(bucket = %config.cache.s3.bucket, retention_days, "cache backend: s3");
            Arc::new(store)
        }
    };

    cleanup::spawn_cleanup(store.clone(), config.defaults.max_age_secs, config.cleanup_interval());

    let renderer: Arc<dyn Renderer> = Arc::new(HeadlessCapturer::new().await?);

    let state = http::AppState {
        defaults: config.defaults.clone(),
        coordinator: Arc::new(capture::Coordinator::new(store, renderer)),
    };

    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    tracing::info!(listen = %config.listen, "webshot listening");
    axum::serve(listener, http::router(state)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;
    use tracing_subscriber::layer::SubscriberExt;

    fn with_filter(filter: &str, check: impl FnOnce()) {
        let subscriber = tracing_subscriber::registry().with(EnvFilter::new(filter));
        tracing::subscriber::with_default(subscriber, check);
    }

    #[test]
    fn test_debug_filter_enables_cache_layer_events() {
        with_filter(default_filter(true), || {
            assert!(tracing::enabled!(target: "webshot_core::cache::local", Level::DEBUG));
            assert!(tracing::enabled!(target: "webshot_core::cache::cleanup", Level::DEBUG));
            assert!(tracing::enabled!(target: "webshot_render", Level::DEBUG));
            assert!(tracing::enabled!(target: "webshot::capture", Level::DEBUG));
            // third-party crates stay at the info default
            assert!(!tracing::enabled!(target: "hyper::proto", Level::DEBUG));
        });
    }

    #[test]
    fn test_default_filter_is_info_only() {
        with_filter(default_filter(false), || {
            assert!(tracing::enabled!(target: "webshot_core::cache::local", Level::INFO));
            assert!(!tracing::enabled!(target: "webshot_core::cache::local", Level::DEBUG));
        });
    }
}
