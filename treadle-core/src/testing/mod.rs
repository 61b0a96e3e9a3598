//! Deterministic test providers.
//!
//! Everything a scheduler test needs to run without real time passing:
//! a manually advanced clock and a set of scripted work implementations
//! whose behavior is fixed up front.
//!
//! # Example
//!
//! ```ignore
//! use treadle_core::testing::{ManualClock, ScriptedWork};
//! use treadle_core::WorkState;
//!
//! let clock = ManualClock::new();
//! let work = ScriptedWork::new("three-step", 3, WorkState::Success);
//! let cranks = work.counter();
//! // hand `work` to the scheduler, then drive timers with
//! // `clock.advance(..)` and observe `cranks`.
//! ```

mod clock;
mod work;

pub use clock::ManualClock;
pub use work::{FanoutWork, FaultingWork, ScriptedWork, WaitingController, WaitingWork};
