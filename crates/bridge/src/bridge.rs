use crate::scheduler::{FrameScheduler, WakeOutcome};
use crate::script::HostEvent;
use crate::wake::{ManualWake, WakeSource};
use harness_common::{KeyCode, KeyEvent};
use harness_input::InputCapture;
use harness_kernel::{BridgeError, Delivery, Kernel, KernelHandle};
use std::time::Duration;

/// Input Capture and Frame Scheduler sharing one kernel handle.
///
/// Hosts wire their key listeners to [`Bridge::on_key_down`] /
/// [`Bridge::on_key_up`], their repaint callback to [`Bridge::on_wake`], and
/// call [`Bridge::start`] once.
#[derive(Debug)]
pub struct Bridge<K, W> {
    kernel: KernelHandle<K>,
    input: InputCapture<K>,
    scheduler: FrameScheduler<K, W>,
}

impl<K: Kernel, W: WakeSource> Bridge<K, W> {
    pub fn new(kernel: K, wake: W) -> Self {
        Self::with_handle(KernelHandle::new(kernel), wake)
    }

    pub fn with_handle(kernel: KernelHandle<K>, wake: W) -> Self {
        Self {
            input: InputCapture::new(kernel.clone()),
            scheduler: FrameScheduler::new(kernel.clone(), wake),
            kernel,
        }
    }

    /// See [`FrameScheduler::with_budget`].
    pub fn with_frame_budget(mut self, budget: Duration) -> Self {
        self.scheduler = self.scheduler.with_budget(budget);
        self
    }

    pub fn kernel(&self) -> &KernelHandle<K> {
        &self.kernel
    }

    pub fn input(&self) -> &InputCapture<K> {
        &self.input
    }

    pub fn scheduler(&self) -> &FrameScheduler<K, W> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut FrameScheduler<K, W> {
        &mut self.scheduler
    }

    pub fn start(&mut self) -> Result<(), BridgeError> {
        self.scheduler.start()
    }

    pub fn on_key_down(&mut self, code: KeyCode) -> Result<Delivery, BridgeError> {
        self.input.on_key_down(code)
    }

    pub fn on_key_up(&mut self, code: KeyCode) -> Result<Delivery, BridgeError> {
        self.input.on_key_up(code)
    }

    pub fn on_key_event(&mut self, event: KeyEvent) -> Result<Delivery, BridgeError> {
        self.input.on_key_event(event)
    }

    pub fn on_wake(&mut self) -> Result<WakeOutcome, BridgeError> {
        self.scheduler.on_wake()
    }
}

impl<K: Kernel> Bridge<K, ManualWake> {
    /// Apply one host event. A `Wake` only fires a wake the scheduler requested.
    pub fn feed(&mut self, event: HostEvent) -> Result<(), BridgeError> {
        match event {
            HostEvent::KeyDown(code) => self.on_key_down(code).map(drop),
            HostEvent::KeyUp(code) => self.on_key_up(code).map(drop),
            HostEvent::Wake => {
                if self.scheduler.wake_source_mut().fire() {
                    self.on_wake().map(drop)
                } else {
                    tracing::debug!("host wake with no request outstanding");
                    Ok(())
                }
            }
        }
    }

    /// Feed every event in order, collecting the errors instead of stopping.
    pub fn feed_all(
        &mut self,
        events: impl IntoIterator<Item = HostEvent>,
    ) -> Vec<(HostEvent, BridgeError)> {
        events
            .into_iter()
            .filter_map(|event| self.feed(event).err().map(|err| (event, err)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_script;
    use harness_kernel::{KernelCall, RecordingKernel};
    use proptest::prelude::*;

    fn started(kernel: RecordingKernel) -> Bridge<RecordingKernel, ManualWake> {
        let mut bridge = Bridge::new(kernel, ManualWake::new());
        let _ = bridge.start();
        bridge
    }

    fn calls(bridge: &Bridge<RecordingKernel, ManualWake>) -> Vec<KernelCall> {
        bridge.kernel().inspect().unwrap().calls().to_vec()
    }

    #[test]
    fn press_wake_release_wake() {
        let mut bridge = started(RecordingKernel::new());
        let errors = bridge.feed_all(parse_script("down:65 wake up:65 wake").unwrap());
        assert!(errors.is_empty());
        assert_eq!(
            calls(&bridge),
            vec![
                KernelCall::Init,
                KernelCall::NotifyKeyDown(KeyCode(65)),
                KernelCall::AdvanceFrame,
                KernelCall::NotifyKeyUp(KeyCode(65)),
                KernelCall::AdvanceFrame,
            ]
        );
    }

    #[test]
    fn failed_init_means_no_further_calls() {
        let mut bridge = Bridge::new(RecordingKernel::new().fail_init(), ManualWake::new());
        assert!(bridge.start().is_err());
        let errors = bridge.feed_all(parse_script("down:65 wake up:65 wake wake").unwrap());

        assert_eq!(calls(&bridge), vec![KernelCall::Init]);
        // wakes were never requested, so only the key events report refusals
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|(_, err)| matches!(err, BridgeError::InitFailed(_))));
        assert_eq!(bridge.input().stats().refused, 2);
    }

    #[test]
    fn failed_key_down_is_isolated() {
        let mut bridge = started(
            RecordingKernel::new().fail_on(KernelCall::NotifyKeyDown(KeyCode(65))),
        );
        let errors = bridge.feed_all(parse_script("down:65 up:66 wake").unwrap());

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, HostEvent::KeyDown(KeyCode(65)));
        assert_eq!(
            calls(&bridge),
            vec![
                KernelCall::Init,
                KernelCall::NotifyKeyDown(KeyCode(65)),
                KernelCall::NotifyKeyUp(KeyCode(66)),
                KernelCall::AdvanceFrame,
            ]
        );
    }

    #[test]
    fn keys_before_start_are_refused() {
        let mut bridge = Bridge::new(RecordingKernel::new(), ManualWake::new());
        assert!(matches!(
            bridge.on_key_down(KeyCode(65)),
            Err(BridgeError::NotInitialized(_))
        ));
        bridge.start().unwrap();
        bridge.on_key_down(KeyCode(65)).unwrap();
        assert_eq!(
            calls(&bridge),
            vec![KernelCall::Init, KernelCall::NotifyKeyDown(KeyCode(65))]
        );
    }

    #[test]
    fn wake_only_fires_when_requested() {
        let mut bridge = started(RecordingKernel::new());
        bridge.feed(HostEvent::Wake).unwrap();
        // the scheduler re-armed, so the next host wake fires too
        bridge.feed(HostEvent::Wake).unwrap();
        assert_eq!(bridge.kernel().inspect().unwrap().frames(), 2);
        assert_eq!(bridge.scheduler().wake_source().requested(), 3);
    }

    fn host_event() -> impl Strategy<Value = HostEvent> {
        prop_oneof![
            (1u32..256).prop_map(|c| HostEvent::KeyDown(KeyCode(c))),
            (1u32..256).prop_map(|c| HostEvent::KeyUp(KeyCode(c))),
            Just(HostEvent::Wake),
        ]
    }

    fn expected(events: &[HostEvent]) -> Vec<KernelCall> {
        std::iter::once(KernelCall::Init)
            .chain(events.iter().map(|event| event.kernel_call()))
            .collect()
    }

    proptest! {
        #[test]
        fn kernel_sees_host_order(events in prop::collection::vec(host_event(), 0..64)) {
            let mut bridge = started(RecordingKernel::new());
            let errors = bridge.feed_all(events.clone());
            prop_assert!(errors.is_empty());

            let want = expected(&events);
            let kernel = bridge.kernel().inspect().unwrap();
            prop_assert_eq!(kernel.calls(), want.as_slice());
            prop_assert!(kernel.violations().is_empty());
        }

        #[test]
        fn faults_never_drop_later_events(
            events in prop::collection::vec(host_event(), 0..64),
            bad in 1u32..256,
        ) {
            let kernel = RecordingKernel::new()
                .fail_on(KernelCall::NotifyKeyDown(KeyCode(bad)))
                .fail_on(KernelCall::AdvanceFrame);
            let mut bridge = started(kernel);
            let errors = bridge.feed_all(events.clone());

            let faults = events
                .iter()
                .filter(|e| matches!(e, HostEvent::Wake) || **e == HostEvent::KeyDown(KeyCode(bad)))
                .count();
            prop_assert_eq!(errors.len(), faults);
            let want = expected(&events);
            let kernel = bridge.kernel().inspect().unwrap();
            prop_assert_eq!(kernel.calls(), want.as_slice());
        }
    }
}
