use crate::interface::{Kernel, KernelCall, KernelFault};
use std::cell::{Cell, Ref, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// Errors from dispatching a call through a [`KernelHandle`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    #[error("kernel is not initialized; {0} refused")]
    NotInitialized(KernelCall),
    #[error("kernel init was already attempted")]
    AlreadyInitialized,
    #[error("kernel init failed; {0} refused")]
    InitFailed(KernelCall),
    #[error("kernel init failed: {0}")]
    Init(KernelFault),
    #[error("{call} failed: {fault}")]
    Fault { call: KernelCall, fault: KernelFault },
}

impl BridgeError {
    /// The kernel fault behind this error, if the kernel was actually called.
    pub fn fault(&self) -> Option<&KernelFault> {
        match self {
            Self::Init(fault) | Self::Fault { fault, .. } => Some(fault),
            _ => None,
        }
    }
}

/// Where the handle is in the kernel's one-shot initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Ready,
    Failed,
}

/// How a successfully dispatched call reached the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The kernel ran the call before `dispatch` returned.
    Delivered,
    /// Another call was in flight; this one runs as soon as that call returns.
    Queued,
}

/// Call counters for instrumentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandleStats {
    pub delivered: u64,
    pub queued: u64,
    pub faulted: u64,
}

struct Shared<K> {
    kernel: RefCell<K>,
    lifecycle: Cell<Lifecycle>,
    busy: Cell<bool>,
    pending: RefCell<VecDeque<KernelCall>>,
    stats: Cell<HandleStats>,
}

/// Shared, single-threaded handle over one kernel instance.
///
/// Clones share the same kernel; the handle is `!Send`, so every clone lives on
/// the thread that created it. All calls funnel through [`KernelHandle::dispatch`],
/// which enforces the kernel's contract:
///
/// - nothing but `init` runs until `init` has succeeded, and nothing at all
///   runs after it failed;
/// - a call dispatched while another is in flight (from inside the kernel, or a
///   host callback that fires mid-call) is queued FIFO and executed right after
///   the in-flight call returns, before control goes back to the host.
pub struct KernelHandle<K> {
    shared: Rc<Shared<K>>,
}

impl<K> Clone for KernelHandle<K> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<K> std::fmt::Debug for KernelHandle<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelHandle")
            .field("lifecycle", &self.shared.lifecycle.get())
            .field("busy", &self.shared.busy.get())
            .field("pending", &self.shared.pending.borrow().len())
            .field("stats", &self.shared.stats.get())
            .finish()
    }
}

impl<K: Kernel> KernelHandle<K> {
    /// Take ownership of an uninitialized kernel.
    pub fn new(kernel: K) -> Self {
        Self {
            shared: Rc::new(Shared {
                kernel: RefCell::new(kernel),
                lifecycle: Cell::new(Lifecycle::Uninitialized),
                busy: Cell::new(false),
                pending: RefCell::new(VecDeque::new()),
                stats: Cell::new(HandleStats::default()),
            }),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.shared.lifecycle.get()
    }

    pub fn is_ready(&self) -> bool {
        self.lifecycle() == Lifecycle::Ready
    }

    /// True while a kernel call is executing.
    pub fn is_busy(&self) -> bool {
        self.shared.busy.get()
    }

    pub fn stats(&self) -> HandleStats {
        self.shared.stats.get()
    }

    /// Run the kernel's one-time initialization.
    ///
    /// Calls deferred while `init` was running are delivered after it succeeds
    /// and discarded if it fails.
    pub fn init(&self) -> Result<(), BridgeError> {
        match self.lifecycle() {
            Lifecycle::Ready => return Err(BridgeError::AlreadyInitialized),
            Lifecycle::Failed => return Err(BridgeError::InitFailed(KernelCall::Init)),
            Lifecycle::Uninitialized if self.is_busy() => {
                return Err(BridgeError::AlreadyInitialized);
            }
            Lifecycle::Uninitialized => {}
        }

        match self.run(KernelCall::Init) {
            Ok(()) => {
                self.shared.lifecycle.set(Lifecycle::Ready);
                tracing::info!("kernel initialized");
                self.drain();
                Ok(())
            }
            Err(fault) => {
                self.shared.lifecycle.set(Lifecycle::Failed);
                let discarded = std::mem::take(&mut *self.shared.pending.borrow_mut());
                if !discarded.is_empty() {
                    tracing::warn!(
                        count = discarded.len(),
                        "discarding calls deferred during failed init"
                    );
                }
                tracing::error!(%fault, "kernel init failed");
                Err(BridgeError::Init(fault))
            }
        }
    }

    /// Deliver one call to the kernel, or queue it behind the call in flight.
    pub fn dispatch(&self, call: KernelCall) -> Result<Delivery, BridgeError> {
        if call.is_init() {
            return self.init().map(|()| Delivery::Delivered);
        }

        match self.lifecycle() {
            Lifecycle::Failed => return Err(BridgeError::InitFailed(call)),
            Lifecycle::Uninitialized if !self.is_busy() => {
                return Err(BridgeError::NotInitialized(call));
            }
            _ => {}
        }

        if self.is_busy() {
            self.shared.pending.borrow_mut().push_back(call);
            self.bump(|s| s.queued += 1);
            tracing::debug!(%call, "kernel busy, call deferred");
            return Ok(Delivery::Queued);
        }

        let result = self.run(call);
        self.drain();
        result
            .map(|()| Delivery::Delivered)
            .map_err(|fault| BridgeError::Fault { call, fault })
    }

    /// Read-only access to the kernel, unavailable while a call is in flight.
    pub fn inspect(&self) -> Option<Ref<'_, K>> {
        self.shared.kernel.try_borrow().ok()
    }

    fn run(&self, call: KernelCall) -> Result<(), KernelFault> {
        self.shared.busy.set(true);
        let result = {
            let mut kernel = self.shared.kernel.borrow_mut();
            call.apply(&mut *kernel)
        };
        self.shared.busy.set(false);

        match &result {
            Ok(()) => self.bump(|s| s.delivered += 1),
            Err(_) => self.bump(|s| s.faulted += 1),
        }
        result
    }

    fn drain(&self) {
        loop {
            let next = self.shared.pending.borrow_mut().pop_front();
            let Some(call) = next else {
                break;
            };
            if let Err(fault) = self.run(call) {
                tracing::warn!(%call, %fault, "deferred kernel call faulted");
            }
        }
    }

    fn bump(&self, f: impl FnOnce(&mut HandleStats)) {
        let mut stats = self.shared.stats.get();
        f(&mut stats);
        self.shared.stats.set(stats);
    }
}
