//! Configuration for the scheduler.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use treadle_core::{Result, TreadleError};

/// Tuning knobs for a [`WorkScheduler`](crate::WorkScheduler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Delay between a schedule request and the corresponding timer
    /// firing.
    ///
    /// Too small starves other reactor work; too large adds latency to
    /// every work-tree transition.
    pub trigger_period: Duration,
    /// CPU budget for a single crank burst.
    ///
    /// One timer firing keeps cranking while the tree is runnable and
    /// this much time has not yet elapsed.
    pub crank_budget: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            trigger_period: Duration::from_millis(50),
            crank_budget: Duration::from_millis(1),
        }
    }
}

impl SchedulerConfig {
    /// Create configuration from environment variables.
    ///
    /// Reads the following environment variables, falling back to the
    /// defaults for any that are unset or unparseable:
    /// - `TREADLE_TRIGGER_PERIOD_MS`: delay between schedule request and
    ///   timer firing, in milliseconds
    /// - `TREADLE_CRANK_BUDGET_US`: crank burst budget, in microseconds
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let trigger_period = std::env::var("TREADLE_TRIGGER_PERIOD_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.trigger_period);

        let crank_budget = std::env::var("TREADLE_CRANK_BUDGET_US")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_micros)
            .unwrap_or(defaults.crank_budget);

        Self {
            trigger_period,
            crank_budget,
        }
    }

    /// Set the trigger period.
    #[must_use]
    pub fn with_trigger_period(mut self, period: Duration) -> Self {
        self.trigger_period = period;
        self
    }

    /// Set the crank burst budget.
    #[must_use]
    pub fn with_crank_budget(mut self, budget: Duration) -> Self {
        self.crank_budget = budget;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    /// Returns [`TreadleError::InvalidConfig`] if either duration is zero:
    /// a zero trigger period degenerates into a busy loop on the reactor,
    /// and a zero crank budget would end every burst after its mandatory
    /// first crank.
    pub fn validate(&self) -> Result<()> {
        if self.trigger_period.is_zero() {
            return Err(TreadleError::InvalidConfig {
                cause: "trigger_period must be non-zero".to_string(),
            });
        }
        if self.crank_budget.is_zero() {
            return Err(TreadleError::InvalidConfig {
                cause: "crank_budget must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}
