//! The root work driver: re-arm guard, crank loop, lifecycle control.
//!
//! A [`WorkScheduler`] owns the root of a cooperative work tree and is the
//! only thing that ever cranks it. Scheduling is a two-state machine,
//! `IDLE` (no timer pending) and `ARMED` (exactly one timer pending),
//! guarded by a single flag:
//!
//! 1. A schedule request arms a timer for "now + trigger period" unless
//!    one is already armed (the request is idempotent).
//! 2. When the timer fires, the callback resolves a weak reference to the
//!    scheduler; a dead reference means the scheduler was dropped with
//!    the timer in flight, and the callback does nothing. Otherwise it
//!    cranks the tree in a burst bounded by [`YieldTimer`], clears the
//!    guard, and re-arms only if the tree is still runnable.
//! 3. A dormant (waiting) tree is woken from the outside through a
//!    [`WakeHandle`], which issues a fresh schedule request.
//!
//! The guard is cleared before the burst outcome is acted on, on the
//! fault path too, so an advancement fault can never leave the scheduler
//! un-armable.

use crate::config::SchedulerConfig;
use crate::yield_timer::YieldTimer;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, debug_span, error, info};
use treadle_core::{Clock, Result, SystemClock, TreadleError, WakeHandle, WakeTarget, Work, WorkState};

/// Callback invoked with every advancement fault that surfaces from a
/// crank burst, after the re-arm guard has been reset.
pub type FaultHook = Box<dyn Fn(&TreadleError) + Send + Sync>;

/// Fluent builder for a [`WorkScheduler`].
///
/// # Example
/// ```ignore
/// let scheduler = WorkScheduler::builder()
///     .config(SchedulerConfig::from_env())
///     .on_fault(|err| metrics::count_fault(err))
///     .create(my_root_work)?;
/// ```
pub struct SchedulerBuilder {
    config: SchedulerConfig,
    clock: Arc<dyn Clock>,
    on_fault: Option<FaultHook>,
}

impl SchedulerBuilder {
    fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
            clock: Arc::new(SystemClock::new()),
            on_fault: None,
        }
    }

    /// Set the scheduler configuration (default: [`SchedulerConfig::default`]).
    #[must_use]
    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom clock; tests inject a
    /// [`ManualClock`](treadle_core::testing::ManualClock) here.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Register a hook for advancement faults.
    ///
    /// Without one, faults are logged at error level and retained for
    /// [`WorkScheduler::take_last_fault`].
    #[must_use]
    pub fn on_fault(mut self, hook: impl Fn(&TreadleError) + Send + Sync + 'static) -> Self {
        self.on_fault = Some(Box::new(hook));
        self
    }

    /// Build the scheduler around `root`: validate the configuration,
    /// start the root work, and execute one synchronous advancement step
    /// so the scheduler has probed its own state before the first timer
    /// ever fires.
    ///
    /// # Errors
    /// Configuration validation failures and faults from the initial
    /// crank surface here.
    pub fn create(self, root: impl Work + 'static) -> Result<WorkScheduler> {
        self.config.validate()?;

        let root: Box<dyn Work> = Box::new(root);
        let name = root.name().to_string();
        let inner = Arc::new_cyclic(|weak| Inner {
            name,
            config: self.config,
            clock: self.clock,
            scheduled: AtomicBool::new(false),
            state: Mutex::new(WorkState::Waiting),
            root: Mutex::new(root),
            on_fault: self.on_fault,
            last_fault: Mutex::new(None),
            weak_self: Weak::clone(weak),
        });

        {
            let mut root = inner.root.lock();
            root.start(WakeHandle::new(inner.weak_self.clone()));
        }
        inner.crank_work()?;

        info!(scheduler = %inner.name, state = %inner.state(), "scheduler created");
        Ok(WorkScheduler { inner })
    }
}

/// The root driver of a cooperative work tree.
///
/// Dropping the scheduler is always safe, even with a timer in flight:
/// timer callbacks hold only weak references and become no-ops once the
/// last strong handle is gone. No explicit cancellation is needed.
///
/// Arming timers uses `tokio::spawn`, so [`shutdown`], [`WakeHandle::wake`]
/// and any tree that wakes itself during `start` require a tokio runtime
/// context. The model is strictly single-threaded cooperative; a
/// current-thread runtime is the intended host.
///
/// [`shutdown`]: WorkScheduler::shutdown
pub struct WorkScheduler {
    inner: Arc<Inner>,
}

impl WorkScheduler {
    /// Start building a scheduler.
    #[must_use]
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    /// Build a scheduler around `root` with the given configuration and
    /// the system clock. See [`SchedulerBuilder::create`].
    ///
    /// # Errors
    /// Configuration validation failures and faults from the initial
    /// crank surface here.
    pub fn create(root: impl Work + 'static, config: SchedulerConfig) -> Result<Self> {
        Self::builder().config(config).create(root)
    }

    /// Name of the root work, used in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Last-computed aggregate state.
    #[must_use]
    pub fn state(&self) -> WorkState {
        self.inner.state()
    }

    /// True once the scheduler has reached a terminal state and will
    /// never crank again on its own.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state().is_terminal()
    }

    /// Trigger handle for external integrations (I/O completions, retry
    /// timers) to request scheduling when the tree becomes runnable
    /// again. Safe to call after the scheduler is dropped.
    #[must_use]
    pub fn wake_handle(&self) -> WakeHandle {
        WakeHandle::new(self.inner.weak_self.clone())
    }

    /// Take the most recent advancement fault, if any surfaced from a
    /// crank burst since the last call.
    #[must_use]
    pub fn take_last_fault(&self) -> Option<TreadleError> {
        self.inner.last_fault.lock().take()
    }

    /// Begin cooperative wind-down.
    ///
    /// Idempotent: a scheduler that is already terminal performs no
    /// action. Otherwise the tree is signalled to wind down and one more
    /// schedule request is issued unconditionally: a dormant scheduler
    /// has no timer pending and nothing else would ever crank the
    /// wind-down to completion.
    ///
    /// Cooperative, not forcible: an in-flight crank burst is never
    /// interrupted.
    pub fn shutdown(&self) {
        if self.is_done() {
            return;
        }
        info!(scheduler = %self.inner.name, "shutting down work tree");
        self.inner.root.lock().shutdown();
        Inner::schedule_one(&self.inner.weak_self);
    }
}

impl fmt::Debug for WorkScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkScheduler")
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .field("armed", &self.inner.scheduled.load(Ordering::Acquire))
            .finish()
    }
}

struct Inner {
    name: String,
    config: SchedulerConfig,
    clock: Arc<dyn Clock>,
    /// Re-arm guard: true iff exactly one timer firing is outstanding.
    scheduled: AtomicBool,
    state: Mutex<WorkState>,
    root: Mutex<Box<dyn Work>>,
    on_fault: Option<FaultHook>,
    last_fault: Mutex<Option<TreadleError>>,
    weak_self: Weak<Inner>,
}

impl WakeTarget for Inner {
    fn request_crank(&self) {
        Inner::schedule_one(&self.weak_self);
    }
}

impl Inner {
    fn state(&self) -> WorkState {
        *self.state.lock()
    }

    /// One advancement step on the tree, plus the root policy: adopt the
    /// tree's terminal state once it is done; otherwise `Running` while
    /// anything below is runnable and `Waiting` when only external events
    /// can make progress.
    fn crank_work(&self) -> Result<WorkState> {
        let mut root = self.root.lock();
        root.crank()?;
        let state = if root.is_done() {
            root.state()
        } else if root.any_child_runnable() {
            WorkState::Running
        } else {
            WorkState::Waiting
        };
        drop(root);

        *self.state.lock() = state;
        Ok(state)
    }

    /// Arm one timer firing, unless the scheduler is gone or one is
    /// already armed. The spawned timer task captures only the weak
    /// reference and the clock, never a strong reference.
    fn schedule_one(weak: &Weak<Inner>) {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        if inner.scheduled.swap(true, Ordering::AcqRel) {
            // already armed; redundant requests are a defined no-op
            return;
        }

        debug!(scheduler = %inner.name, period = ?inner.config.trigger_period, "arming trigger timer");
        let sleep = inner.clock.sleep(inner.config.trigger_period);
        let weak = Weak::clone(weak);
        drop(inner);
        tokio::spawn(async move {
            sleep.await;
            Inner::on_trigger(weak);
        });
    }

    /// Timer-firing callback: resolve the weak reference, run one bounded
    /// crank burst, clear the guard, then conditionally re-arm.
    fn on_trigger(weak: Weak<Inner>) {
        let Some(inner) = weak.upgrade() else {
            // destroyed while the timer was pending; expected, not an error
            return;
        };
        let _span = debug_span!("crank_burst", scheduler = %inner.name).entered();

        let budget = YieldTimer::new(Arc::clone(&inner.clock), inner.config.crank_budget);
        let mut cranked: u32 = 0;
        // Always crank at least once per firing; keep going while the
        // tree stays runnable and the budget permits.
        let outcome = loop {
            match inner.crank_work() {
                Ok(state) => {
                    cranked += 1;
                    if state != WorkState::Running || !budget.should_keep_going() {
                        break Ok(state);
                    }
                }
                Err(err) => break Err(err),
            }
        };

        // Back to IDLE before the outcome is acted on, unconditionally,
        // so an advancement fault never leaves the scheduler un-armable.
        inner.scheduled.store(false, Ordering::Release);

        match outcome {
            Ok(WorkState::Running) => {
                debug!(cranked, "budget exhausted with work remaining; re-arming");
                Inner::schedule_one(&weak);
            }
            Ok(state) => {
                debug!(cranked, state = %state, "burst finished; going dormant");
            }
            Err(err) => inner.report_fault(err),
        }
    }

    fn report_fault(&self, err: TreadleError) {
        error!(scheduler = %self.name, error = %err, "advancement fault; guard reset, not re-arming");
        if let Some(hook) = &self.on_fault {
            hook(&err);
        }
        *self.last_fault.lock() = Some(err);
    }
}
