//! Periodic refresh driver for the queue watcher.
//!
//! One background task owns the cadence. Interval refreshes run
//! strictly one at a time: the loop awaits the callback inline, and
//! ticks that land while a refresh is still running are skipped rather
//! than queued. Manual refreshes run on the caller's task and are
//! deliberately exempt from that serialization, matching how an
//! operator's refresh button behaves next to the timer.
//!
//! Stopping (or dropping) the scheduler never aborts a refresh that is
//! already in flight; it only prevents further ticks.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

type RefreshFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type RefreshFn = Arc<dyn Fn() -> RefreshFuture + Send + Sync>;

/// Decrements the in-flight counter when a refresh finishes, including
/// when the refresh future is dropped mid-await.
struct InFlightGuard<'a>(&'a AtomicU32);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn run_refresh(refresh: &RefreshFn, in_flight: &AtomicU32, limit: Option<Duration>) {
    in_flight.fetch_add(1, Ordering::SeqCst);
    let _guard = InFlightGuard(in_flight);

    match limit {
        Some(limit) => {
            if tokio::time::timeout(limit, (refresh)()).await.is_err() {
                tracing::warn!(timeout_secs = limit.as_secs(), "refresh timed out, abandoned");
            }
        }
        None => (refresh)().await,
    }
}

/// Drives a refresh callback on a fixed interval.
///
/// The scheduler itself is cheap state: a callback, an interval, and a
/// stop handle. All methods take `&self`, so it can live behind an
/// `Arc` and be started, stopped, and toggled from anywhere.
pub struct RefreshScheduler {
    interval: Duration,
    timeout: Option<Duration>,
    refresh: RefreshFn,
    in_flight: Arc<AtomicU32>,
    stop: Mutex<Option<watch::Sender<bool>>>,
}

impl RefreshScheduler {
    pub fn new<F, Fut>(interval: Duration, refresh: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            interval,
            timeout: None,
            refresh: Arc::new(move || -> RefreshFuture { Box::pin(refresh()) }),
            in_flight: Arc::new(AtomicU32::new(0)),
            stop: Mutex::new(None),
        }
    }

    /// Caps how long a single refresh may run. A refresh that exceeds
    /// the cap is dropped where it stands and the cadence continues.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// A poisoned lock only means a starter panicked mid-update; the
    /// handle inside is still coherent either way.
    fn stop_handle(&self) -> std::sync::MutexGuard<'_, Option<watch::Sender<bool>>> {
        self.stop.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawns the interval loop. Returns false when already running.
    /// The first refresh fires one full interval after the call.
    pub fn start(&self) -> bool {
        let mut handle = self.stop_handle();
        if handle.is_some() {
            return false;
        }
        let (stop_tx, mut stop_rx) = watch::channel(false);
        *handle = Some(stop_tx);

        let interval = self.interval;
        let timeout = self.timeout;
        let refresh = Arc::clone(&self.refresh);
        let in_flight = Arc::clone(&self.in_flight);

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        run_refresh(&refresh, &in_flight, timeout).await;
                    }
                }
            }
            tracing::debug!("refresh loop stopped");
        });
        true
    }

    /// Ends the cadence. An in-flight refresh runs to completion, but
    /// no further ticks fire. Returns false when nothing was running.
    pub fn stop(&self) -> bool {
        self.stop_handle().take().is_some()
    }

    /// Flips between running and stopped; returns the new running state.
    pub fn toggle(&self) -> bool {
        if self.is_active() {
            self.stop();
            false
        } else {
            self.start();
            true
        }
    }

    pub fn is_active(&self) -> bool {
        self.stop_handle().is_some()
    }

    /// True while any refresh (interval or manual) is executing.
    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Runs one refresh immediately on the caller's task, regardless of
    /// whether the cadence is running or an interval refresh is in
    /// flight. The interval's phase is not disturbed.
    pub async fn manual_refresh(&self) {
        run_refresh(&self.refresh, &self.in_flight, self.timeout).await;
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Interval far beyond test runtime; tick behavior is covered by the
    // paused-clock suite in tests/.
    fn idle_scheduler() -> RefreshScheduler {
        RefreshScheduler::new(Duration::from_secs(3600), || async {})
    }

    #[tokio::test]
    async fn test_starts_stopped_and_idle() {
        let scheduler = idle_scheduler();
        assert!(!scheduler.is_active());
        assert!(!scheduler.is_refreshing());
    }

    #[tokio::test]
    async fn test_start_and_stop_report_transitions() {
        let scheduler = idle_scheduler();
        assert!(scheduler.start());
        assert!(scheduler.is_active());
        // Second start is a no-op on a running scheduler.
        assert!(!scheduler.start());

        assert!(scheduler.stop());
        assert!(!scheduler.is_active());
        assert!(!scheduler.stop());
    }

    #[tokio::test]
    async fn test_toggle_flips_state() {
        let scheduler = idle_scheduler();
        assert!(scheduler.toggle());
        assert!(scheduler.is_active());
        assert!(!scheduler.toggle());
        assert!(!scheduler.is_active());
    }

    #[tokio::test]
    async fn test_manual_refresh_runs_without_cadence() {
        let count = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&count);
        let scheduler = RefreshScheduler::new(Duration::from_secs(3600), move || {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });

        scheduler.manual_refresh().await;
        scheduler.manual_refresh().await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(!scheduler.is_active());
        assert!(!scheduler.is_refreshing());
    }
}
