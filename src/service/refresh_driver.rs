//! Periodic in-place refresh of a listing's loaded items.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::ListingService;
use crate::domain::ListingItem;
use crate::source::ItemRefresher;

/// Default interval between refresh ticks.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(2000);

/// How long [`RefreshHandle::stop`] waits for an in-flight tick.
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(1);

/// Spawns refresh loops with a fixed tick interval.
#[derive(Debug, Clone, Copy)]
pub struct RefreshDriver {
    interval: Duration,
}

impl Default for RefreshDriver {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL)
    }
}

impl RefreshDriver {
    /// Creates a driver ticking every `interval` (at least 1 ms).
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    /// Tick interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts refreshing `listing` through `refresher`. The first tick
    /// fires one interval from now.
    ///
    /// The loop holds only a weak reference to `listing` and ends once the
    /// listing is dropped, the handle is stopped, or the handle is dropped.
    #[must_use]
    pub fn spawn<T: ListingItem>(
        &self,
        listing: &Arc<ListingService<T>>,
        refresher: Arc<dyn ItemRefresher<T>>,
    ) -> RefreshHandle {
        let weak = Arc::downgrade(listing);
        let stop = Arc::new(Notify::new());
        let period = self.interval;
        let session_id = listing.session_id();

        let task = tokio::spawn({
            let stop = Arc::clone(&stop);
            async move {
                let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        () = stop.notified() => break,
                        _ = ticker.tick() => {
                            let Some(listing) = weak.upgrade() else {
                                break;
                            };
                            let _ = listing.refresh_items(refresher.as_ref()).await;
                        }
                    }
                }
                tracing::debug!(%session_id, "refresh loop stopped");
            }
        });

        RefreshHandle {
            stop,
            task: Some(task),
        }
    }
}

/// Owner of a running refresh loop.
///
/// [`stop`](Self::stop) lets an in-flight tick finish within a grace
/// period and aborts it after that; dropping the handle aborts it
/// immediately. Either way no further tick runs.
#[derive(Debug)]
pub struct RefreshHandle {
    stop: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    /// Signals the loop to end and waits up to [`DEFAULT_STOP_GRACE`] for it.
    pub async fn stop(self) {
        self.stop_within(DEFAULT_STOP_GRACE).await;
    }

    /// Signals the loop to end and waits up to `grace` for an in-flight
    /// tick. A tick still running after `grace` is aborted.
    pub async fn stop_within(mut self, grace: Duration) {
        self.stop.notify_one();
        if let Some(mut task) = self.task.take()
            && tokio::time::timeout(grace, &mut task).await.is_err()
        {
            tracing::debug!("refresh tick overran stop grace, aborting");
            task.abort();
        }
    }

    /// Returns `true` once the loop has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::project::tests::project;
    use crate::domain::{EventBus, Feed, FilterKey, LaunchStatus, Page, Project, SessionId};
    use crate::error::ListingError;
    use crate::source::PageRequest;
    use crate::testing::{ScriptedRefresher, ScriptedSource};

    async fn loaded_listing() -> Arc<ListingService<Project>> {
        let source = ScriptedSource::new(|_: &PageRequest| {
            let items = vec![
                project("0x01", LaunchStatus::Processing),
                project("0x02", LaunchStatus::Processing),
            ];
            (
                Duration::ZERO,
                Ok(Page {
                    items,
                    has_next_page: false,
                }),
            )
        });
        let listing = Arc::new(ListingService::for_feed(
            SessionId::new(),
            Feed::Potting,
            9,
            source,
            EventBus::new(64),
        ));
        let _ = listing.reload_page().await;
        listing
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_after_one_interval() {
        let listing = loaded_listing().await;
        let refresher = ScriptedRefresher::new(|p: &Project| Ok(p.clone()));
        let handle = RefreshDriver::default().spawn(&listing, Arc::clone(&refresher) as _);

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(refresher.calls(), 0);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(refresher.calls(), 2);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failing_tick_does_not_stop_the_loop() {
        let listing = loaded_listing().await;
        let refresher = ScriptedRefresher::new(|p: &Project| {
            Err(ListingError::Refresh {
                address: p.address.clone(),
                message: "node unavailable".to_string(),
            })
        });
        let handle = RefreshDriver::default().spawn(&listing, Arc::clone(&refresher) as _);

        tokio::time::sleep(Duration::from_millis(2001)).await;
        assert_eq!(refresher.calls(), 2);
        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(refresher.calls(), 4);

        let snapshot = listing.snapshot().await;
        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.error, None);
        assert!(!handle.is_finished());
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn refreshed_values_land_in_place() {
        let listing = loaded_listing().await;
        let refresher = ScriptedRefresher::new(|p: &Project| {
            Ok(p.clone().with_metric(FilterKey::DepositedRaisedToken, 10.0))
        });
        let handle = RefreshDriver::new(Duration::from_millis(500))
            .spawn(&listing, Arc::clone(&refresher) as _);

        tokio::time::sleep(Duration::from_millis(501)).await;
        let snapshot = listing.snapshot().await;
        let addresses: Vec<&str> = snapshot.items.iter().map(|p| p.address.as_str()).collect();
        assert_eq!(addresses, vec!["0x01", "0x02"]);
        assert!(
            snapshot
                .items
                .iter()
                .all(|p| p.metric(FilterKey::DepositedRaisedToken) == Some(10.0))
        );
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn no_tick_after_stop_or_drop() {
        let listing = loaded_listing().await;
        let refresher = ScriptedRefresher::new(|p: &Project| Ok(p.clone()));

        let stopped = RefreshDriver::default().spawn(&listing, Arc::clone(&refresher) as _);
        stopped.stop().await;
        let dropped = RefreshDriver::default().spawn(&listing, Arc::clone(&refresher) as _);
        drop(dropped);

        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert_eq!(refresher.calls(), 0);
    }

    struct StalledRefresher {
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ItemRefresher<Project> for StalledRefresher {
        async fn refresh(&self, item: &Project) -> Result<Project, ListingError> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(item.clone())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stop_does_not_wait_for_a_stalled_tick() {
        let listing = loaded_listing().await;
        let refresher = Arc::new(StalledRefresher {
            calls: std::sync::atomic::AtomicUsize::new(0),
        });
        let handle = RefreshDriver::new(Duration::from_millis(100))
            .spawn(&listing, Arc::clone(&refresher) as _);

        tokio::time::sleep(Duration::from_millis(101)).await;
        assert_eq!(refresher.calls.load(std::sync::atomic::Ordering::SeqCst), 2);

        let started = Instant::now();
        handle.stop_within(Duration::from_millis(50)).await;
        assert!(started.elapsed() < Duration::from_secs(1));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(refresher.calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn loop_ends_when_listing_is_dropped() {
        let listing = loaded_listing().await;
        let refresher = ScriptedRefresher::new(|p: &Project| Ok(p.clone()));
        let handle = RefreshDriver::default().spawn(&listing, Arc::clone(&refresher) as _);
        drop(listing);

        tokio::time::sleep(Duration::from_millis(2001)).await;
        assert!(handle.is_finished());
        assert_eq!(refresher.calls(), 0);
    }
}
