//! Core traits for treadle components.
//!
//! This module defines the contract between a hierarchical work tree and
//! the scheduler that drives it:
//! - [`Work`]: the probe-and-advance surface a tree exposes
//! - [`WakeHandle`] / [`WakeTarget`]: the trigger a dormant tree uses to
//!   request scheduling again

mod work;

pub use work::{WakeHandle, WakeTarget, Work};
