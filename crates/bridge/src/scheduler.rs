use crate::pacing::FramePacing;
use crate::wake::WakeSource;
use harness_kernel::{BridgeError, Delivery, Kernel, KernelCall, KernelHandle};
use std::time::{Duration, Instant};

/// Where the scheduler is in its run.
///
/// `Uninitialized -> Armed -> Advancing -> Armed -> ...`. `Failed` is reached
/// only when `init` faults and is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Uninitialized,
    Armed,
    Advancing,
    Failed,
}

/// What a wake did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeOutcome {
    /// One `advance_frame` was handed to the kernel and the next wake requested.
    Advanced(Delivery),
    /// The scheduler was not armed; nothing was called.
    Ignored,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub frames: u64,
    pub faulted: u64,
    pub ignored_wakes: u64,
}

/// Drives the kernel at the host's display cadence.
///
/// Each wake advances exactly one frame and only then asks the host for the
/// next wake, so a slow frame delays the following one instead of queueing a
/// backlog. There is no catch-up and no frame dropping.
#[derive(Debug)]
pub struct FrameScheduler<K, W> {
    kernel: KernelHandle<K>,
    wake: W,
    state: SchedulerState,
    budget: Option<Duration>,
    pacing: FramePacing,
    stats: SchedulerStats,
}

impl<K: Kernel, W: WakeSource> FrameScheduler<K, W> {
    pub fn new(kernel: KernelHandle<K>, wake: W) -> Self {
        Self {
            kernel,
            wake,
            state: SchedulerState::Uninitialized,
            budget: None,
            pacing: FramePacing::default(),
            stats: SchedulerStats::default(),
        }
    }

    /// Log a warning whenever one frame takes longer than `budget`.
    ///
    /// Diagnostic only: slow frames are still awaited, never cut off.
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    pub fn pacing(&self) -> &FramePacing {
        &self.pacing
    }

    pub fn wake_source(&self) -> &W {
        &self.wake
    }

    pub fn wake_source_mut(&mut self) -> &mut W {
        &mut self.wake
    }

    /// Initialize the kernel and arm the first wake.
    ///
    /// Calling `start` on a running scheduler does nothing: `init` never runs
    /// twice and a second wake is never stacked on the outstanding one. After
    /// a failed `init` every later `start` is refused.
    pub fn start(&mut self) -> Result<(), BridgeError> {
        match self.state {
            SchedulerState::Armed | SchedulerState::Advancing => {
                tracing::debug!("frame scheduler already running");
                return Ok(());
            }
            SchedulerState::Failed => return Err(BridgeError::InitFailed(KernelCall::Init)),
            SchedulerState::Uninitialized => {}
        }

        match self.kernel.init() {
            // the host initialized this kernel through another bridge component
            Ok(()) | Err(BridgeError::AlreadyInitialized) => {}
            Err(err) => {
                self.state = SchedulerState::Failed;
                tracing::error!(%err, "frame scheduler not started");
                return Err(err);
            }
        }

        self.arm();
        tracing::info!("frame scheduler started");
        Ok(())
    }

    /// Host callback: one wake fired.
    ///
    /// Kernel faults are logged and returned, and the scheduler re-arms anyway
    /// so one bad frame does not freeze the loop.
    pub fn on_wake(&mut self) -> Result<WakeOutcome, BridgeError> {
        if self.state != SchedulerState::Armed {
            self.stats.ignored_wakes += 1;
            tracing::debug!(state = ?self.state, "wake ignored");
            return Ok(WakeOutcome::Ignored);
        }

        self.state = SchedulerState::Advancing;
        let started = Instant::now();
        let result = self.kernel.dispatch(KernelCall::AdvanceFrame);
        let took = started.elapsed();

        self.pacing.record(took);
        if let Some(budget) = self.budget.filter(|budget| took > *budget) {
            self.pacing.note_overrun();
            tracing::warn!(?took, ?budget, "frame exceeded budget");
        }

        match &result {
            Ok(_) => self.stats.frames += 1,
            Err(err) => {
                self.stats.faulted += 1;
                tracing::warn!(%err, "frame advance faulted");
            }
        }

        self.arm();
        result.map(WakeOutcome::Advanced)
    }

    fn arm(&mut self) {
        self.state = SchedulerState::Armed;
        self.wake.request_wake();
    }
}
