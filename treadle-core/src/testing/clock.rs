//! Manually advanced clock for deterministic tests.

use crate::clock::{Clock, SleepFuture};
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

/// Clock that only moves when told to.
///
/// [`advance`] wakes every sleep whose deadline has passed, which is how
/// tests drive timer firings without real time elapsing. Note that a
/// sleep registers itself on first poll, not on creation: on a
/// current-thread runtime, yield to the executor after arming a timer and
/// before advancing, or the advance will not see it.
///
/// Cloning is cheap; clones share the same time line.
///
/// [`advance`]: ManualClock::advance
#[derive(Clone, Default)]
pub struct ManualClock {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    now_nanos: AtomicU64,
    next_sleep_id: AtomicU64,
    sleepers: Mutex<Vec<Sleeper>>,
}

struct Sleeper {
    id: u64,
    deadline: u64,
    waker: Option<Waker>,
}

impl ManualClock {
    /// Create a clock at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward, waking every sleep whose deadline has passed.
    pub fn advance(&self, duration: Duration) {
        let nanos = duration.as_nanos() as u64;
        let now = self.inner.now_nanos.fetch_add(nanos, Ordering::SeqCst) + nanos;

        let mut sleepers = self.inner.sleepers.lock();
        sleepers.retain_mut(|sleeper| {
            if sleeper.deadline <= now {
                if let Some(waker) = sleeper.waker.take() {
                    waker.wake();
                }
                false
            } else {
                true
            }
        });
    }

    /// Number of sleeps currently registered and not yet expired.
    ///
    /// With the scheduler under test, this is exactly the number of armed
    /// timers: the hook that lets tests assert "one pending timer, not
    /// two" and "nothing armed after terminal state".
    #[must_use]
    pub fn pending_sleeps(&self) -> usize {
        self.inner.sleepers.lock().len()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.inner.now_nanos.load(Ordering::SeqCst)
    }

    fn sleep(&self, duration: Duration) -> SleepFuture {
        let deadline = self.now().saturating_add(duration.as_nanos() as u64);
        let id = self.inner.next_sleep_id.fetch_add(1, Ordering::Relaxed);
        Box::pin(ManualSleep {
            inner: Arc::clone(&self.inner),
            id,
            deadline,
            registered: false,
        })
    }
}

struct ManualSleep {
    inner: Arc<Inner>,
    id: u64,
    deadline: u64,
    registered: bool,
}

impl Future for ManualSleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.inner.now_nanos.load(Ordering::SeqCst) >= self.deadline {
            if self.registered {
                let mut sleepers = self.inner.sleepers.lock();
                let id = self.id;
                sleepers.retain(|s| s.id != id);
            }
            return Poll::Ready(());
        }

        let (id, deadline) = (self.id, self.deadline);
        let mut sleepers = self.inner.sleepers.lock();
        if let Some(existing) = sleepers.iter_mut().find(|s| s.id == id) {
            existing.waker = Some(cx.waker().clone());
        } else {
            sleepers.push(Sleeper {
                id,
                deadline,
                waker: Some(cx.waker().clone()),
            });
            drop(sleepers);
            self.registered = true;
        }
        Poll::Pending
    }
}

impl Drop for ManualSleep {
    fn drop(&mut self) {
        if self.registered {
            let mut sleepers = self.inner.sleepers.lock();
            sleepers.retain(|s| s.id != self.id);
        }
    }
}
