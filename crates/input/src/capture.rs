use harness_common::{KeyCode, KeyEvent};
use harness_kernel::{BridgeError, Delivery, Kernel, KernelCall, KernelHandle};

/// Per-listener counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputStats {
    /// Events handed to the kernel (delivered or queued behind a call in flight).
    pub forwarded: u64,
    /// Events the kernel reported a fault for.
    pub faulted: u64,
    /// Events refused because the kernel never became ready.
    pub refused: u64,
}

/// Forwards key transitions to the kernel, one call per host event.
///
/// No coalescing, no repeat suppression, no rate limiting. Kernel faults are
/// logged and returned; the listener keeps going either way.
#[derive(Debug)]
pub struct InputCapture<K> {
    kernel: KernelHandle<K>,
    stats: InputStats,
}

impl<K: Kernel> InputCapture<K> {
    pub fn new(kernel: KernelHandle<K>) -> Self {
        Self {
            kernel,
            stats: InputStats::default(),
        }
    }

    pub fn stats(&self) -> InputStats {
        self.stats
    }

    /// Key transitioned to pressed, including host auto-repeat.
    pub fn on_key_down(&mut self, code: KeyCode) -> Result<Delivery, BridgeError> {
        self.on_key_event(KeyEvent::down(code))
    }

    /// Key released.
    pub fn on_key_up(&mut self, code: KeyCode) -> Result<Delivery, BridgeError> {
        self.on_key_event(KeyEvent::up(code))
    }

    pub fn on_key_event(&mut self, event: KeyEvent) -> Result<Delivery, BridgeError> {
        let call = KernelCall::from(event);
        let result = self.kernel.dispatch(call);
        match &result {
            Ok(delivery) => {
                self.stats.forwarded += 1;
                tracing::debug!(%call, ?delivery, "key event forwarded");
            }
            Err(err @ BridgeError::Fault { .. }) => {
                self.stats.forwarded += 1;
                self.stats.faulted += 1;
                tracing::warn!(%err, "kernel faulted on key event");
            }
            Err(err) => {
                self.stats.refused += 1;
                tracing::debug!(%err, "key event not forwarded");
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harness_kernel::RecordingKernel;

    fn ready(kernel: RecordingKernel) -> (KernelHandle<RecordingKernel>, InputCapture<RecordingKernel>) {
        let handle = KernelHandle::new(kernel);
        handle.init().unwrap();
        let capture = InputCapture::new(handle.clone());
        (handle, capture)
    }

    #[test]
    fn forwards_each_transition_once() {
        let (handle, mut input) = ready(RecordingKernel::new());
        input.on_key_down(KeyCode(65)).unwrap();
        input.on_key_down(KeyCode(65)).unwrap(); // repeat passes through
        input.on_key_up(KeyCode(65)).unwrap();

        assert_eq!(
            handle.inspect().unwrap().calls(),
            &[
                KernelCall::Init,
                KernelCall::NotifyKeyDown(KeyCode(65)),
                KernelCall::NotifyKeyDown(KeyCode(65)),
                KernelCall::NotifyKeyUp(KeyCode(65)),
            ]
        );
        assert_eq!(input.stats().forwarded, 3);
    }

    #[test]
    fn failed_key_down_does_not_stop_listening() {
        let (handle, mut input) =
            ready(RecordingKernel::new().fail_on(KernelCall::NotifyKeyDown(KeyCode(65))));

        let err = input.on_key_down(KeyCode(65)).unwrap_err();
        assert!(err.fault().is_some());
        assert_eq!(input.on_key_up(KeyCode(66)), Ok(Delivery::Delivered));

        assert_eq!(
            handle.inspect().unwrap().calls().last(),
            Some(&KernelCall::NotifyKeyUp(KeyCode(66)))
        );
        let stats = input.stats();
        assert_eq!((stats.forwarded, stats.faulted, stats.refused), (2, 1, 0));
    }

    #[test]
    fn refuses_until_kernel_ready() {
        let handle = KernelHandle::new(RecordingKernel::new());
        let mut input = InputCapture::new(handle.clone());
        assert!(matches!(
            input.on_key_down(KeyCode(65)),
            Err(BridgeError::NotInitialized(_))
        ));
        assert_eq!(input.stats().refused, 1);
        assert!(handle.inspect().unwrap().calls().is_empty());
    }
}
