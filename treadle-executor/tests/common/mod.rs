//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::time::Duration;
use treadle_core::testing::ManualClock;
use treadle_executor::SchedulerConfig;

/// Trigger period used by every integration test.
pub const TRIGGER_PERIOD: Duration = Duration::from_millis(50);

/// Crank budget used by every integration test.
pub const CRANK_BUDGET: Duration = Duration::from_millis(1);

/// Explicit config so tests can advance the clock by exactly one trigger
/// period per firing.
pub fn test_config() -> SchedulerConfig {
    SchedulerConfig::default()
        .with_trigger_period(TRIGGER_PERIOD)
        .with_crank_budget(CRANK_BUDGET)
}

/// Let spawned timer tasks run. On the current-thread runtime each yield
/// gives every ready task a poll, so a handful is enough for the
/// spawn → register-sleep → fire → burst → re-arm chain.
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

/// Fire the next armed timer: make sure its sleep has registered, advance
/// one trigger period, then let the timer task run its burst.
pub async fn fire_timer(clock: &ManualClock) {
    settle().await;
    clock.advance(TRIGGER_PERIOD);
    settle().await;
}

/// Install a test subscriber so `RUST_LOG`-less test runs still show
/// scheduler activity on failure.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}
