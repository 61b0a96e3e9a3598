//! Prelude for convenient imports.
//!
//! ```ignore
//! use treadle_core::prelude::*;
//! ```

pub use crate::clock::{Clock, SleepFuture, SystemClock};
pub use crate::error::{Result, TreadleError};
pub use crate::state::WorkState;
pub use crate::traits::{WakeHandle, WakeTarget, Work};
