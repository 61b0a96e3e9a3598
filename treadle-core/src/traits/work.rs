//! The work-tree contract consumed by the scheduler.

use crate::error::Result;
use crate::state::WorkState;
use std::fmt;
use std::sync::Weak;

/// Receiver side of a [`WakeHandle`].
///
/// Implemented by the scheduler; work trees only ever see the handle.
pub trait WakeTarget: Send + Sync {
    /// Request that one more crank cycle be scheduled.
    ///
    /// Idempotent: requesting while a cycle is already pending is a no-op.
    fn request_crank(&self);
}

/// Cloneable trigger a work tree uses to request scheduling when a
/// dormant subtree becomes runnable again: an I/O completion, a retry
/// timer expiring, a child being attached.
///
/// The handle holds only a weak reference to its target. Waking after the
/// scheduler has been destroyed is a defined no-op, so handles may be
/// stashed in callbacks that outlive the scheduler.
#[derive(Clone)]
pub struct WakeHandle {
    target: Weak<dyn WakeTarget>,
}

impl WakeHandle {
    /// Build a handle over the given target.
    #[must_use]
    pub fn new(target: Weak<dyn WakeTarget>) -> Self {
        Self { target }
    }

    /// A handle that drops every wake on the floor.
    ///
    /// Useful for detached trees and unit tests that never need the
    /// scheduler to react.
    #[must_use]
    pub fn noop() -> Self {
        Self {
            target: Weak::<Noop>::new(),
        }
    }

    /// Fire the trigger.
    ///
    /// Resolution failure means the scheduler is gone; the wake is
    /// silently discarded.
    pub fn wake(&self) {
        match self.target.upgrade() {
            Some(target) => target.request_crank(),
            None => tracing::trace!("wake on destroyed scheduler ignored"),
        }
    }

    /// True while the target scheduler is still alive.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.target.strong_count() > 0
    }
}

impl fmt::Debug for WakeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WakeHandle")
            .field("live", &self.is_live())
            .finish()
    }
}

struct Noop;

impl WakeTarget for Noop {
    fn request_crank(&self) {}
}

/// A unit in the hierarchical task tree.
///
/// Implementations are cooperative state machines: [`crank`] performs one
/// bounded step and must never block the calling thread. Anything that
/// would block is modeled as a sub-task that reports [`WorkState::Running`]
/// or [`WorkState::Waiting`] until it is ready. Child management (attach,
/// detach, retry policy) is the implementation's own business; the
/// scheduler only consumes this probe surface.
///
/// [`crank`]: Work::crank
pub trait Work: Send {
    /// Human-readable name, used in logs and error context.
    fn name(&self) -> &str;

    /// Attach and initialize the node.
    ///
    /// Called at most once, before any crank. The `wake` handle must be
    /// invoked whenever a dormant subtree becomes runnable again; after
    /// [`shutdown`] it must keep being invoked until the tree reaches a
    /// terminal state, or the wind-down will stall.
    ///
    /// [`shutdown`]: Work::shutdown
    fn start(&mut self, wake: WakeHandle);

    /// Perform one bounded unit of progress on the tree rooted at this
    /// node and return its aggregate state afterward.
    ///
    /// Safe to call repeatedly, including when nothing is currently
    /// runnable (such a crank is a cheap state probe). An `Err` is an
    /// advancement fault: the scheduler resets its re-arm guard and hands
    /// the fault to its fault hook without retrying.
    fn crank(&mut self) -> Result<WorkState>;

    /// Last-computed aggregate state, without side effects.
    fn state(&self) -> WorkState;

    /// True if some node in this subtree is neither waiting for an
    /// external event nor terminal.
    fn any_child_runnable(&self) -> bool;

    /// True once this node has reached a terminal state and will never
    /// run again.
    fn is_done(&self) -> bool {
        self.state().is_terminal()
    }

    /// Begin cooperative wind-down of the whole subtree.
    ///
    /// Idempotent. Cranking must continue to make progress toward a
    /// terminal state afterward; wind-down work counts as runnable.
    fn shutdown(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct CountingTarget {
        hits: AtomicU32,
    }

    impl WakeTarget for CountingTarget {
        fn request_crank(&self) {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn wake_reaches_live_target() {
        let target = Arc::new(CountingTarget {
            hits: AtomicU32::new(0),
        });
        let weak: Weak<dyn WakeTarget> = Arc::downgrade(&(target.clone() as Arc<dyn WakeTarget>));
        let handle = WakeHandle::new(weak);

        assert!(handle.is_live());
        handle.wake();
        handle.wake();
        assert_eq!(target.hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn wake_after_target_drop_is_noop() {
        let target = Arc::new(CountingTarget {
            hits: AtomicU32::new(0),
        });
        let weak: Weak<dyn WakeTarget> = Arc::downgrade(&(target.clone() as Arc<dyn WakeTarget>));
        let handle = WakeHandle::new(weak);
        drop(target);

        assert!(!handle.is_live());
        handle.wake(); // must not panic
    }

    #[test]
    fn noop_handle_is_dead_on_arrival() {
        let handle = WakeHandle::noop();
        assert!(!handle.is_live());
        handle.wake();
    }
}
