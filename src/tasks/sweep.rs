//! Expiration Sweep Task
//!
//! Background task that periodically removes expired cache entries, so
//! entries that are written once and never read again do not pile up.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::cache::SharedCache;

// == Sweep Task ==
/// Handle to a running sweep. Stopping or dropping it cancels the task.
#[derive(Debug)]
pub struct SweepTask {
    handle: JoinHandle<()>,
}

impl SweepTask {
    /// Cancels the sweep. The store is only touched while the lock is held
    /// and no await happens under the lock, so cancellation never leaves it
    /// half-swept.
    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SweepTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawns a task that sweeps expired entries every `interval`.
///
/// Sweeps run one at a time on a single loop; a tick that comes due while a
/// sweep is still running is skipped rather than queued.
///
/// # Example
/// ```ignore
/// let cache = shared(CacheStore::new(CacheConfig::default()));
/// let sweep = spawn_sweep_task(cache.clone(), Duration::from_secs(300));
/// // Later, during shutdown:
/// sweep.stop();
/// ```
pub fn spawn_sweep_task(cache: SharedCache, interval: Duration) -> SweepTask {
    let handle = tokio::spawn(async move {
        info!(
            "Starting expiration sweep with interval of {} ms",
            interval.as_millis()
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; nothing can have expired yet
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let removed = {
                let mut cache_guard = cache.write().await;
                cache_guard.cleanup_expired()
            };

            if removed > 0 {
                info!("Expiration sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiration sweep: no expired entries found");
            }
        }
    });

    SweepTask { handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    use crate::cache::{shared, CacheStore, ManualClock};
    use crate::config::CacheConfig;

    fn cache_with_clock() -> (SharedCache, ManualClock) {
        let clock = ManualClock::starting_now();
        let store = CacheStore::with_clock(CacheConfig::default(), Arc::new(clock.clone()));
        (shared(store), clock)
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_entries_without_lookups() {
        let (cache, clock) = cache_with_clock();
        {
            let mut guard = cache.write().await;
            guard.set("soon".to_string(), json!(1), Some(Duration::from_secs(1)));
            guard.set("later".to_string(), json!(2), Some(Duration::from_secs(3_600)));
        }
        clock.advance(Duration::from_secs(2));

        let sweep = spawn_sweep_task(cache.clone(), Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(200)).await;

        {
            let guard = cache.read().await;
            assert!(guard.peek("soon").is_none(), "expired entry should be swept");
            assert!(guard.peek("later").is_some());
            assert_eq!(guard.stats().total_requests, 0);
        }

        sweep.stop();
    }

    #[tokio::test]
    async fn test_sweep_can_be_stopped() {
        let (cache, _clock) = cache_with_clock();
        let sweep = spawn_sweep_task(cache, Duration::from_millis(50));

        sweep.stop();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(sweep.is_finished(), "Task should be finished after stop");
    }

    #[tokio::test]
    async fn test_dropping_handle_cancels_sweep() {
        let (cache, clock) = cache_with_clock();
        {
            let mut guard = cache.write().await;
            guard.set("soon".to_string(), json!(1), Some(Duration::from_secs(1)));
        }

        drop(spawn_sweep_task(cache.clone(), Duration::from_millis(20)));
        clock.advance(Duration::from_secs(5));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(
            cache.read().await.peek("soon").is_some(),
            "no sweep should run after the handle is dropped"
        );
    }
}
