//! Treadle Core Library
//!
//! This crate provides the foundational types and traits for the treadle
//! work scheduler: the contract a hierarchical work tree exposes to its
//! driver, the aggregate state model, the wake-up plumbing that lets a
//! dormant tree request scheduling again, and the clock abstraction that
//! keeps crank bursts bounded and testable.
//!
//! # Overview
//!
//! Treadle drives a tree of long-running, cooperative work state machines
//! from a single reactor thread. A unit of work advances in small bounded
//! steps ("cranks") and reports an aggregate [`WorkState`]; the driver in
//! `treadle-executor` decides when to crank and for how long. This crate
//! owns everything both sides agree on:
//!
//! - **State**: the [`WorkState`] aggregate model
//! - **Traits**: the [`Work`] contract and the [`WakeHandle`] trigger
//! - **Clock**: the [`Clock`] abstraction over monotonic time and one-shot
//!   timers
//! - **Testing**: deterministic providers ([`testing::ManualClock`],
//!   scripted work implementations) for reproducible tests
//!
//! # Example
//!
//! ```ignore
//! use treadle_core::prelude::*;
//!
//! struct MyWork { /* ... */ }
//!
//! impl Work for MyWork {
//!     fn name(&self) -> &str { "my-work" }
//!     fn start(&mut self, wake: WakeHandle) { /* stash the handle */ }
//!     fn crank(&mut self) -> Result<WorkState> { /* one bounded step */ }
//!     // ...
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod error;
pub mod prelude;
pub mod state;
pub mod testing;
pub mod traits;

// Re-export key types at crate root for convenience
pub use clock::{Clock, SleepFuture, SystemClock};
pub use error::{Result, TreadleError};
pub use state::WorkState;
pub use traits::{WakeHandle, WakeTarget, Work};
