//! Background cleanup scheduling.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::CacheStore;

/// Spawn the periodic cleanup task for `store`.
///
/// Returns `None` without spawning anything when `max_age_secs` is zero
/// (entries never expire, so there is nothing to sweep) or when `interval`
/// is zero. Otherwise the task runs for the life of the process, invoking
/// [`CacheStore::run_cleanup`] once per interval; the first sweep happens a
/// full interval after startup.
pub fn spawn_cleanup(store: Arc<dyn CacheStore>, max_age_secs: u64, interval: Duration) -> Option<JoinHandle<()>> {
    if max_age_secs == 0 || interval.is_zero() {
        tracing::debug!("cache cleanup disabled");
        return None;
    }

    tracing::info!(interval_secs = interval.as_secs(), max_age_secs, "cache cleanup scheduled");

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // the first tick of a tokio interval fires immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            tracing::debug!("running cache cleanup");
            store.run_cleanup(max_age_secs).await;
        }
    }))
}
