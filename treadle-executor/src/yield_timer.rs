//! Crank budget guard.

use std::sync::Arc;
use std::time::Duration;
use treadle_core::Clock;

/// Answers whether a crank burst should keep looping within the current
/// timer firing.
///
/// Constructed at the top of a burst with the clock and the allotted
/// budget; [`should_keep_going`] stays true until that much time has
/// elapsed. Pure query over the clock: no side effects, no state beyond
/// the deadline computed at construction.
///
/// [`should_keep_going`]: YieldTimer::should_keep_going
pub struct YieldTimer {
    clock: Arc<dyn Clock>,
    deadline: u64,
}

impl YieldTimer {
    /// Start a budget window of `budget` from the clock's current reading.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, budget: Duration) -> Self {
        let deadline = clock.now().saturating_add(budget.as_nanos() as u64);
        Self { clock, deadline }
    }

    /// True while the caller should perform another iteration.
    #[must_use]
    pub fn should_keep_going(&self) -> bool {
        self.clock.now() < self.deadline
    }
}
