//! Clock abstraction for budget checks and timer arming.
//!
//! The scheduler only ever consumes time through the [`Clock`] trait: the
//! crank budget guard reads [`Clock::now`], and the re-arm path awaits
//! [`Clock::sleep`]. Production code uses [`SystemClock`] over the host's
//! monotonic clock and tokio timers; tests inject a manually advanced
//! clock for fully deterministic behavior.

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

/// Future returned by [`Clock::sleep`].
pub type SleepFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Monotonic time source plus a one-shot timer primitive.
pub trait Clock: Send + Sync {
    /// Monotonic reading in nanoseconds since an arbitrary epoch.
    ///
    /// Only differences between readings are meaningful.
    fn now(&self) -> u64;

    /// A future that resolves once `duration` has elapsed.
    ///
    /// The caller arms a timer by spawning a task that awaits this future;
    /// dropping the future before it resolves cancels the timer.
    fn sleep(&self, duration: Duration) -> SleepFuture;
}

/// Clock backed by the host's monotonic clock and tokio timers.
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    /// Create a new system clock. Readings are relative to this moment.
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }

    fn sleep(&self, duration: Duration) -> SleepFuture {
        Box::pin(tokio::time::sleep(duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_advances() {
        let clock = SystemClock::new();
        let t1 = clock.now();
        std::thread::sleep(Duration::from_millis(5));
        let t2 = clock.now();
        assert!(t2 > t1);
    }

    #[tokio::test]
    async fn system_clock_sleep_resolves() {
        let clock = SystemClock::new();
        clock.sleep(Duration::from_millis(1)).await;
    }
}
