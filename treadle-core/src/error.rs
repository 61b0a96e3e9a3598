//! Error types for treadle.
//!
//! Strongly-typed errors with actionable context. Every variant names the
//! work node it concerns so a fault can be traced through the tree without
//! a debugger attached.

use thiserror::Error;

/// The main error type for treadle operations.
#[derive(Error, Debug)]
pub enum TreadleError {
    // =========================================================================
    // Configuration (E001-E009)
    // =========================================================================
    /// Scheduler configuration failed validation.
    #[error("E001: invalid scheduler config: {cause}")]
    InvalidConfig {
        /// Why the configuration was rejected.
        cause: String,
    },

    // =========================================================================
    // Work tree (E010-E019)
    // =========================================================================
    /// An advancement step raised an unexpected fault.
    ///
    /// The scheduler does not retry these; retry policy, if any, belongs
    /// to the work tree itself.
    #[error("E010: work '{name}' failed to advance: {cause}")]
    Advance {
        /// Name of the failing work node.
        name: String,
        /// Reason for the failure.
        cause: String,
    },

    /// `Work::crank` was invoked before `Work::start`.
    #[error("E011: work '{name}' was cranked before being started")]
    NotStarted {
        /// Name of the offending work node.
        name: String,
    },
}

/// Convenience result alias used throughout treadle.
pub type Result<T> = std::result::Result<T, TreadleError>;
