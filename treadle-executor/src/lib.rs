//! Treadle Executor - the self-rearming crank driver.
//!
//! This crate provides the scheduling discipline that sits on top of a
//! cooperative work tree:
//! - [`WorkScheduler`] - the root driver: re-arm guard, crank loop,
//!   lifecycle control
//! - [`YieldTimer`] - the crank budget guard bounding how long one timer
//!   firing may monopolize the reactor thread
//! - [`SchedulerConfig`] - trigger period and crank budget tuning
//!
//! The scheduler never blocks the reactor: each timer firing executes a
//! bounded burst of advancement steps, then either re-arms itself (tree
//! still runnable) or goes dormant until an external wake-up arrives.
//! Timer callbacks hold only weak references, so dropping the scheduler
//! with a timer in flight is always safe.

#![warn(missing_docs)]

pub mod config;
pub mod scheduler;
pub mod yield_timer;

pub use config::SchedulerConfig;
pub use scheduler::{FaultHook, SchedulerBuilder, WorkScheduler};
pub use yield_timer::YieldTimer;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::SchedulerConfig;
    pub use crate::scheduler::{FaultHook, SchedulerBuilder, WorkScheduler};
    pub use crate::yield_timer::YieldTimer;
    pub use treadle_core::prelude::*;
}
