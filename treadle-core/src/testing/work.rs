//! Scripted work implementations for driving the scheduler in tests.
//!
//! Each type fixes its behavior up front so tests can assert exact crank
//! counts and state transitions: [`ScriptedWork`] needs a known number of
//! steps, [`FaultingWork`] fails at a known step, [`WaitingWork`] stays
//! dormant until released, and [`FanoutWork`] composes children into a
//! round-robin tree.

use crate::error::{Result, TreadleError};
use crate::state::WorkState;
use crate::traits::{WakeHandle, Work};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// Leaf work that needs a fixed number of cranks to reach a terminal
/// state, and is runnable the whole way there.
pub struct ScriptedWork {
    name: String,
    remaining: u32,
    final_state: WorkState,
    state: WorkState,
    started: bool,
    aborting: bool,
    cranks: Arc<AtomicU32>,
    on_crank: Option<Box<dyn FnMut() + Send>>,
}

impl ScriptedWork {
    /// Work that reaches `final_state` after exactly `steps` cranks.
    ///
    /// `final_state` must be terminal.
    #[must_use]
    pub fn new(name: impl Into<String>, steps: u32, final_state: WorkState) -> Self {
        assert!(final_state.is_terminal(), "final state must be terminal");
        Self {
            name: name.into(),
            remaining: steps,
            final_state,
            state: if steps == 0 {
                final_state
            } else {
                WorkState::Running
            },
            started: false,
            aborting: false,
            cranks: Arc::new(AtomicU32::new(0)),
            on_crank: None,
        }
    }

    /// Run `hook` on every productive crank, e.g. to advance a
    /// [`ManualClock`](super::ManualClock) and exhaust the crank budget.
    #[must_use]
    pub fn with_on_crank(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.on_crank = Some(Box::new(hook));
        self
    }

    /// Shared crank counter, observable after the work has been moved
    /// into the scheduler.
    #[must_use]
    pub fn counter(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.cranks)
    }
}

impl Work for ScriptedWork {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self, _wake: WakeHandle) {
        assert!(!self.started, "work '{}' started twice", self.name);
        self.started = true;
    }

    fn crank(&mut self) -> Result<WorkState> {
        if !self.started {
            return Err(TreadleError::NotStarted {
                name: self.name.clone(),
            });
        }
        if self.state.is_terminal() {
            return Ok(self.state);
        }
        if self.aborting {
            self.state = WorkState::Aborted;
            return Ok(self.state);
        }

        if let Some(hook) = self.on_crank.as_mut() {
            hook();
        }
        self.cranks.fetch_add(1, Ordering::SeqCst);
        self.remaining -= 1;
        self.state = if self.remaining == 0 {
            self.final_state
        } else {
            WorkState::Running
        };
        Ok(self.state)
    }

    fn state(&self) -> WorkState {
        self.state
    }

    fn any_child_runnable(&self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.aborting || self.state.is_runnable()
    }

    fn shutdown(&mut self) {
        if !self.state.is_terminal() {
            self.aborting = true;
        }
    }
}

/// Leaf work that cranks successfully a fixed number of times, then
/// returns an advancement fault on every crank after that.
pub struct FaultingWork {
    name: String,
    ok_cranks: u32,
    started: bool,
    state: WorkState,
}

impl FaultingWork {
    /// Work whose crank succeeds `ok_cranks` times and faults afterward.
    #[must_use]
    pub fn new(name: impl Into<String>, ok_cranks: u32) -> Self {
        Self {
            name: name.into(),
            ok_cranks,
            started: false,
            state: WorkState::Running,
        }
    }
}

impl Work for FaultingWork {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self, _wake: WakeHandle) {
        assert!(!self.started, "work '{}' started twice", self.name);
        self.started = true;
    }

    fn crank(&mut self) -> Result<WorkState> {
        if !self.started {
            return Err(TreadleError::NotStarted {
                name: self.name.clone(),
            });
        }
        if self.ok_cranks == 0 {
            return Err(TreadleError::Advance {
                name: self.name.clone(),
                cause: "scripted fault".to_string(),
            });
        }
        self.ok_cranks -= 1;
        Ok(self.state)
    }

    fn state(&self) -> WorkState {
        self.state
    }

    fn any_child_runnable(&self) -> bool {
        self.state.is_runnable()
    }

    fn shutdown(&mut self) {
        self.state = WorkState::Aborted;
    }
}

/// Shared control surface of a [`WaitingWork`], usable after the work has
/// been moved into the scheduler.
#[derive(Clone)]
pub struct WaitingController {
    shared: Arc<WaitingShared>,
}

struct WaitingShared {
    runnable: AtomicBool,
    wake: Mutex<Option<WakeHandle>>,
    cranks: AtomicU32,
}

impl WaitingController {
    /// Simulate the external event the work was waiting for: mark the
    /// work runnable and wake the scheduler through the handle it handed
    /// out at start.
    pub fn release(&self) {
        self.shared.runnable.store(true, Ordering::SeqCst);
        if let Some(wake) = self.shared.wake.lock().as_ref() {
            wake.wake();
        }
    }

    /// Number of productive cranks observed so far.
    #[must_use]
    pub fn cranks(&self) -> u32 {
        self.shared.cranks.load(Ordering::SeqCst)
    }
}

/// Leaf work that reports [`WorkState::Waiting`] until released, then
/// needs a fixed number of cranks to succeed.
///
/// Models a task blocked on an I/O completion: dormant, woken from the
/// outside through the scheduler's wake handle.
pub struct WaitingWork {
    name: String,
    remaining: u32,
    started: bool,
    aborting: bool,
    state: WorkState,
    shared: Arc<WaitingShared>,
}

impl WaitingWork {
    /// Work that waits until released, then succeeds after `steps` cranks.
    #[must_use]
    pub fn new(name: impl Into<String>, steps: u32) -> Self {
        Self {
            name: name.into(),
            remaining: steps.max(1),
            started: false,
            aborting: false,
            state: WorkState::Waiting,
            shared: Arc::new(WaitingShared {
                runnable: AtomicBool::new(false),
                wake: Mutex::new(None),
                cranks: AtomicU32::new(0),
            }),
        }
    }

    /// Control surface for releasing the work and observing its cranks.
    #[must_use]
    pub fn controller(&self) -> WaitingController {
        WaitingController {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Work for WaitingWork {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self, wake: WakeHandle) {
        assert!(!self.started, "work '{}' started twice", self.name);
        self.started = true;
        *self.shared.wake.lock() = Some(wake);
    }

    fn crank(&mut self) -> Result<WorkState> {
        if !self.started {
            return Err(TreadleError::NotStarted {
                name: self.name.clone(),
            });
        }
        if self.state.is_terminal() {
            return Ok(self.state);
        }
        if self.aborting {
            self.state = WorkState::Aborted;
            return Ok(self.state);
        }
        if !self.shared.runnable.load(Ordering::SeqCst) {
            self.state = WorkState::Waiting;
            return Ok(self.state);
        }

        self.shared.cranks.fetch_add(1, Ordering::SeqCst);
        self.remaining -= 1;
        self.state = if self.remaining == 0 {
            WorkState::Success
        } else {
            WorkState::Running
        };
        Ok(self.state)
    }

    fn state(&self) -> WorkState {
        self.state
    }

    fn any_child_runnable(&self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.aborting || self.shared.runnable.load(Ordering::SeqCst)
    }

    fn shutdown(&mut self) {
        if !self.state.is_terminal() {
            self.aborting = true;
        }
    }
}

/// Parent work that cranks its children round-robin, one child step per
/// crank, and aggregates their states.
///
/// Aggregation: all children terminal → `Failure` if any failed,
/// `Aborted` if winding down or any child aborted, `Success` otherwise;
/// some child runnable → `Running`; otherwise `Waiting`.
pub struct FanoutWork {
    name: String,
    children: Vec<Box<dyn Work>>,
    next: usize,
    started: bool,
    aborting: bool,
    state: WorkState,
}

impl FanoutWork {
    /// Empty tree root; attach children with [`with_child`](Self::with_child).
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            next: 0,
            started: false,
            aborting: false,
            state: WorkState::Waiting,
        }
    }

    /// Attach a child. Children must be attached before the tree starts.
    #[must_use]
    pub fn with_child(mut self, child: impl Work + 'static) -> Self {
        assert!(!self.started, "cannot attach children after start");
        self.children.push(Box::new(child));
        self
    }

    fn aggregate(&self) -> WorkState {
        let all_done = self.children.iter().all(|c| c.is_done());
        if all_done && (self.aborting || !self.children.is_empty()) {
            if self
                .children
                .iter()
                .any(|c| c.state() == WorkState::Failure)
            {
                WorkState::Failure
            } else if self.aborting
                || self
                    .children
                    .iter()
                    .any(|c| c.state() == WorkState::Aborted)
            {
                WorkState::Aborted
            } else {
                WorkState::Success
            }
        } else if self
            .children
            .iter()
            .any(|c| !c.is_done() && c.any_child_runnable())
        {
            WorkState::Running
        } else {
            WorkState::Waiting
        }
    }
}

impl Work for FanoutWork {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self, wake: WakeHandle) {
        assert!(!self.started, "work '{}' started twice", self.name);
        self.started = true;
        for child in &mut self.children {
            child.start(wake.clone());
        }
        self.state = self.aggregate();
    }

    fn crank(&mut self) -> Result<WorkState> {
        if !self.started {
            return Err(TreadleError::NotStarted {
                name: self.name.clone(),
            });
        }
        if self.state.is_terminal() {
            return Ok(self.state);
        }

        let count = self.children.len();
        for offset in 0..count {
            let index = (self.next + offset) % count;
            let child = &mut self.children[index];
            if !child.is_done() && child.any_child_runnable() {
                child.crank()?;
                self.next = (index + 1) % count;
                break;
            }
        }

        self.state = self.aggregate();
        Ok(self.state)
    }

    fn state(&self) -> WorkState {
        self.state
    }

    fn any_child_runnable(&self) -> bool {
        self.children
            .iter()
            .any(|c| !c.is_done() && c.any_child_runnable())
    }

    fn shutdown(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.aborting = true;
        for child in &mut self.children {
            child.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_work_counts_down_to_terminal() {
        let mut work = ScriptedWork::new("two-step", 2, WorkState::Success);
        let cranks = work.counter();
        work.start(WakeHandle::noop());

        assert_eq!(work.crank().unwrap(), WorkState::Running);
        assert_eq!(work.crank().unwrap(), WorkState::Success);
        assert!(work.is_done());
        assert_eq!(cranks.load(Ordering::SeqCst), 2);

        // terminal cranks are cheap probes
        assert_eq!(work.crank().unwrap(), WorkState::Success);
        assert_eq!(cranks.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn scripted_work_rejects_crank_before_start() {
        let mut work = ScriptedWork::new("unstarted", 1, WorkState::Success);
        assert!(matches!(
            work.crank(),
            Err(TreadleError::NotStarted { .. })
        ));
    }

    #[test]
    fn scripted_work_aborts_on_next_crank_after_shutdown() {
        let mut work = ScriptedWork::new("aborted", 5, WorkState::Success);
        work.start(WakeHandle::noop());
        work.crank().unwrap();

        work.shutdown();
        assert!(work.any_child_runnable(), "wind-down counts as runnable");
        assert_eq!(work.crank().unwrap(), WorkState::Aborted);
        assert!(!work.any_child_runnable());
    }

    #[test]
    fn faulting_work_faults_after_good_cranks() {
        let mut work = FaultingWork::new("flaky", 1);
        work.start(WakeHandle::noop());
        assert!(work.crank().is_ok());
        assert!(matches!(work.crank(), Err(TreadleError::Advance { .. })));
    }

    #[test]
    fn waiting_work_is_dormant_until_released() {
        let mut work = WaitingWork::new("io-bound", 1);
        let controller = work.controller();
        work.start(WakeHandle::noop());

        assert_eq!(work.crank().unwrap(), WorkState::Waiting);
        assert!(!work.any_child_runnable());

        controller.release();
        assert!(work.any_child_runnable());
        assert_eq!(work.crank().unwrap(), WorkState::Success);
        assert_eq!(controller.cranks(), 1);
    }

    #[test]
    fn fanout_round_robins_children_and_aggregates() {
        let a = ScriptedWork::new("a", 2, WorkState::Success);
        let b = ScriptedWork::new("b", 2, WorkState::Success);
        let a_cranks = a.counter();
        let b_cranks = b.counter();

        let mut root = FanoutWork::new("root").with_child(a).with_child(b);
        root.start(WakeHandle::noop());
        assert_eq!(root.state(), WorkState::Running);

        for _ in 0..4 {
            root.crank().unwrap();
        }
        assert_eq!(root.state(), WorkState::Success);
        assert_eq!(a_cranks.load(Ordering::SeqCst), 2);
        assert_eq!(b_cranks.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn fanout_failure_dominates_success() {
        let good = ScriptedWork::new("good", 1, WorkState::Success);
        let bad = ScriptedWork::new("bad", 1, WorkState::Failure);

        let mut root = FanoutWork::new("root").with_child(good).with_child(bad);
        root.start(WakeHandle::noop());

        for _ in 0..2 {
            root.crank().unwrap();
        }
        assert_eq!(root.state(), WorkState::Failure);
    }

    #[test]
    fn fanout_with_waiting_child_goes_dormant() {
        let ready = ScriptedWork::new("ready", 1, WorkState::Success);
        let parked = WaitingWork::new("parked", 1);

        let mut root = FanoutWork::new("root").with_child(ready).with_child(parked);
        root.start(WakeHandle::noop());

        root.crank().unwrap();
        assert_eq!(root.state(), WorkState::Waiting);
        assert!(!root.any_child_runnable());
    }

    #[test]
    fn empty_fanout_waits_instead_of_succeeding() {
        let mut root = FanoutWork::new("empty");
        root.start(WakeHandle::noop());
        assert_eq!(root.crank().unwrap(), WorkState::Waiting);
    }

    #[test]
    fn fanout_shutdown_drains_to_aborted() {
        let slow = ScriptedWork::new("slow", 10, WorkState::Success);
        let mut root = FanoutWork::new("root").with_child(slow);
        root.start(WakeHandle::noop());
        root.crank().unwrap();

        root.shutdown();
        assert!(root.any_child_runnable());
        root.crank().unwrap();
        assert_eq!(root.state(), WorkState::Aborted);
        assert!(root.is_done());
    }
}
