//! Aggregate state model for work nodes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate state of a work node, as observed by the scheduler.
///
/// A node is either making progress ([`Running`]), parked until some
/// external event arrives ([`Waiting`]), or finished for good (one of the
/// three terminal states). The scheduler only ever branches on "runnable
/// vs. dormant vs. terminal"; the distinction between the terminal states
/// is for the owner of the tree.
///
/// [`Running`]: WorkState::Running
/// [`Waiting`]: WorkState::Waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkState {
    /// The node (or something below it) has a runnable step right now;
    /// cranking will make progress.
    Running,
    /// Blocked on an external event. Cranking is futile until a wake-up
    /// arrives.
    Waiting,
    /// Terminal: ran to completion.
    Success,
    /// Terminal: failed and will not be retried at this level.
    Failure,
    /// Terminal: wound down before completion.
    Aborted,
}

impl WorkState {
    /// True once the node will never run again.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failure | Self::Aborted)
    }

    /// True if cranking the node right now would make progress.
    #[must_use]
    pub fn is_runnable(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Stable lowercase name, as used in logs and serialized forms.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Waiting => "waiting",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for WorkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_classification() {
        assert!(!WorkState::Running.is_terminal());
        assert!(!WorkState::Waiting.is_terminal());
        assert!(WorkState::Success.is_terminal());
        assert!(WorkState::Failure.is_terminal());
        assert!(WorkState::Aborted.is_terminal());
    }

    #[test]
    fn only_running_is_runnable() {
        assert!(WorkState::Running.is_runnable());
        assert!(!WorkState::Waiting.is_runnable());
        assert!(!WorkState::Aborted.is_runnable());
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(WorkState::Waiting.to_string(), "waiting");
        assert_eq!(WorkState::Success.as_str(), "success");
    }
}
