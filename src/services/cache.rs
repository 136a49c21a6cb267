// src/services/cache.rs
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::models::NetworkSnapshot;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
struct Slot {
    fetched_at: DateTime<Utc>,
    snapshot: NetworkSnapshot,
}

/// Single-slot memo for the network-info fetch.
///
/// A failed refresh leaves the previous snapshot in place but does not serve it
/// and does not touch its timestamp, so the next call tries the fetch again.
pub struct NetworkCache {
    window: Duration,
    clock: Arc<dyn Clock>,
    slot: Mutex<Option<Slot>>,
}

impl NetworkCache {
    pub fn new(window: Duration) -> Self {
        Self::with_clock(window, Arc::new(SystemClock))
    }

    pub fn with_clock(window: Duration, clock: Arc<dyn Clock>) -> Self {
        NetworkCache {
            window,
            clock,
            slot: Mutex::new(None),
        }
    }

    /// The cached snapshot, if it is younger than the window.
    pub async fn get(&self) -> Option<NetworkSnapshot> {
        let slot = self.slot.lock().await;
        self.fresh(slot.as_ref())
    }

    pub async fn is_stale(&self) -> bool {
        let slot = self.slot.lock().await;
        self.fresh(slot.as_ref()).is_none()
    }

    /// Serve from the slot while fresh, otherwise run `fetch` and store a
    /// successful result. The lock is only taken to read and to swap the slot,
    /// never across the fetch; concurrent refreshes are last-writer-wins.
    pub async fn get_or_refresh<F, Fut>(&self, fetch: F) -> Option<NetworkSnapshot>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<NetworkSnapshot>>,
    {
        if let Some(snapshot) = self.get().await {
            debug!("Serving network info from cache");
            return Some(snapshot);
        }

        info!("Network info cache expired, fetching");
        let snapshot = fetch().await?;
        self.store(snapshot.clone()).await;
        Some(snapshot)
    }

    async fn store(&self, snapshot: NetworkSnapshot) {
        let mut slot = self.slot.lock().await;
        *slot = Some(Slot {
            fetched_at: self.clock.now(),
            snapshot,
        });
    }

    fn fresh(&self, slot: Option<&Slot>) -> Option<NetworkSnapshot> {
        slot.filter(|s| self.clock.now() - s.fetched_at < self.window)
            .map(|s| s.snapshot.clone())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) struct ManualClock(std::sync::Mutex<DateTime<Utc>>);

    impl ManualClock {
        pub(crate) fn new() -> Arc<Self> {
            Arc::new(ManualClock(std::sync::Mutex::new(Utc::now())))
        }

        pub(crate) fn advance(&self, by: Duration) {
            let mut now = self.0.lock().unwrap();
            *now = *now + by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn snapshot(height: u64) -> NetworkSnapshot {
        NetworkSnapshot {
            height,
            hashrate: 12.5,
            difficulty: 900,
        }
    }

    #[tokio::test]
    async fn serves_cached_value_within_window() {
        let clock = ManualClock::new();
        let cache = NetworkCache::with_clock(Duration::seconds(60), clock.clone());
        let calls = AtomicUsize::new(0);

        let first = cache
            .get_or_refresh(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Some(snapshot(1))
            })
            .await;
        clock.advance(Duration::seconds(59));
        let second = cache
            .get_or_refresh(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Some(snapshot(2))
            })
            .await;

        assert_eq!(first, Some(snapshot(1)));
        assert_eq!(second, Some(snapshot(1)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refetches_after_window() {
        let clock = ManualClock::new();
        let cache = NetworkCache::with_clock(Duration::seconds(60), clock.clone());

        cache.get_or_refresh(|| async { Some(snapshot(1)) }).await;
        clock.advance(Duration::seconds(60));
        assert!(cache.is_stale().await);
        assert_eq!(cache.get().await, None);

        let fresh = cache.get_or_refresh(|| async { Some(snapshot(2)) }).await;
        assert_eq!(fresh, Some(snapshot(2)));
        assert_eq!(cache.get().await, Some(snapshot(2)));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_old_value_and_retries() {
        let clock = ManualClock::new();
        let cache = NetworkCache::with_clock(Duration::seconds(60), clock.clone());

        cache.get_or_refresh(|| async { Some(snapshot(1)) }).await;
        clock.advance(Duration::seconds(90));

        assert_eq!(cache.get_or_refresh(|| async { None }).await, None);
        assert_eq!(cache.slot.lock().await.as_ref().map(|s| s.snapshot.height), Some(1));
        assert!(cache.is_stale().await);

        let calls = AtomicUsize::new(0);
        let next = cache
            .get_or_refresh(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Some(snapshot(3))
            })
            .await;
        assert_eq!(next, Some(snapshot(3)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn hung_refresh_does_not_block_other_callers() {
        let cache = Arc::new(NetworkCache::new(Duration::seconds(60)));

        let stuck = Arc::clone(&cache);
        let hung = tokio::spawn(async move {
            stuck
                .get_or_refresh(|| std::future::pending::<Option<NetworkSnapshot>>())
                .await
        });
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let second = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            cache.get_or_refresh(|| async { Some(snapshot(4)) }),
        )
        .await
        .expect("second caller must not wait on the hung fetch");
        assert_eq!(second, Some(snapshot(4)));
        assert_eq!(cache.get().await, Some(snapshot(4)));

        hung.abort();
    }

    #[tokio::test]
    async fn empty_cache_is_stale() {
        let cache = NetworkCache::new(Duration::seconds(60));
        assert!(cache.is_stale().await);
        assert_eq!(cache.get().await, None);
    }
}
