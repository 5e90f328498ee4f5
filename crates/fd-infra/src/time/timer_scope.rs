use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

type TimerMap = HashMap<TimerId, AbortHandle>;

/// Owner of a set of timeouts and intervals.
///
/// Every timer registered here is released exactly once: when it fires
/// (timeouts), when it is cancelled, or when the scope is dropped. Dropping
/// the scope aborts everything still pending, so a component that owns a
/// `TimerScope` cannot leak timers past its own lifetime.
///
/// Timers run as tokio tasks; registering one requires a runtime context.
pub struct TimerScope {
    next_id: AtomicU64,
    timers: Arc<Mutex<TimerMap>>,
}

fn lock(timers: &Mutex<TimerMap>) -> MutexGuard<'_, TimerMap> {
    timers.lock().unwrap_or_else(|e| e.into_inner())
}

impl TimerScope {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            timers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn next_id(&self) -> TimerId {
        TimerId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Run `f` once after `delay`.
    ///
    /// The timer deregisters itself right before `f` runs; cancelling it
    /// afterwards is a no-op.
    pub fn set_timeout<F, Fut>(&self, delay: Duration, f: F) -> TimerId
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_id();
        let timers = Arc::clone(&self.timers);

        // Held across spawn so the task cannot deregister before it is registered.
        let mut guard = lock(&self.timers);
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            lock(&timers).remove(&id);
            f().await;
        });
        guard.insert(id, handle.abort_handle());

        debug!(timer = id.0, delay_ms = delay.as_millis() as u64, "timeout registered");
        id
    }

    /// Run `f` every `period`, first after one full period.
    pub fn set_interval<F, Fut>(&self, period: Duration, f: F) -> TimerId
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let period = if period.is_zero() {
            warn!("zero interval period, using 1ms");
            Duration::from_millis(1)
        } else {
            period
        };

        let id = self.next_id();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                f().await;
            }
        });
        lock(&self.timers).insert(id, handle.abort_handle());

        debug!(timer = id.0, period_ms = period.as_millis() as u64, "interval registered");
        id
    }

    /// Cancel one timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&self, id: TimerId) -> bool {
        match lock(&self.timers).remove(&id) {
            Some(handle) => {
                handle.abort();
                debug!(timer = id.0, "timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancel every pending timer, returning how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<_> = lock(&self.timers).drain().collect();
        for (_, handle) in &drained {
            handle.abort();
        }
        drained.len()
    }

    pub fn active_count(&self) -> usize {
        lock(&self.timers).len()
    }
}

impl Default for TimerScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TimerScope {
    fn drop(&mut self) {
        let cancelled = self.cancel_all();
        if cancelled > 0 {
            debug!(cancelled, "timer scope dropped");
        }
    }
}
