use crate::interface::{Kernel, KernelCall, KernelFault};
use harness_common::KeyCode;

/// Kernel that records every call it receives and checks the calling contract.
///
/// Used by tests and by the CLI's scripted runs. Faults can be injected on
/// `init` or on any specific call.
#[derive(Debug, Clone, Default)]
pub struct RecordingKernel {
    calls: Vec<KernelCall>,
    violations: Vec<String>,
    fail_init: bool,
    fail_on: Vec<KernelCall>,
    init_state: Option<bool>,
}

impl RecordingKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `init` fault.
    pub fn fail_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// Make every occurrence of `call` fault.
    pub fn fail_on(mut self, call: KernelCall) -> Self {
        self.fail_on.push(call);
        self
    }

    /// Every call received, in order, including the ones that faulted.
    pub fn calls(&self) -> &[KernelCall] {
        &self.calls
    }

    /// Contract breaches observed so far. Empty when the caller behaved.
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    pub fn frames(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| **c == KernelCall::AdvanceFrame)
            .count()
    }

    fn record(&mut self, call: KernelCall) -> Result<(), KernelFault> {
        match (call, self.init_state) {
            (KernelCall::Init, Some(_)) => self.violations.push("init called twice".into()),
            (KernelCall::Init, None) => {}
            (_, None) => self.violations.push(format!("{call} before init")),
            (_, Some(false)) => self.violations.push(format!("{call} after failed init")),
            (_, Some(true)) => {}
        }
        self.calls.push(call);

        let fail = if call.is_init() {
            self.fail_init
        } else {
            self.fail_on.contains(&call)
        };
        if call.is_init() && self.init_state.is_none() {
            self.init_state = Some(!fail);
        }
        if fail {
            Err(KernelFault::new("injected fault"))
        } else {
            Ok(())
        }
    }
}

impl Kernel for RecordingKernel {
    fn init(&mut self) -> Result<(), KernelFault> {
        self.record(KernelCall::Init)
    }

    fn notify_key_down(&mut self, code: KeyCode) -> Result<(), KernelFault> {
        self.record(KernelCall::NotifyKeyDown(code))
    }

    fn notify_key_up(&mut self, code: KeyCode) -> Result<(), KernelFault> {
        self.record(KernelCall::NotifyKeyUp(code))
    }

    fn advance_frame(&mut self) -> Result<(), KernelFault> {
        self.record(KernelCall::AdvanceFrame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let mut k = RecordingKernel::new();
        k.init().unwrap();
        k.notify_key_down(KeyCode(65)).unwrap();
        k.advance_frame().unwrap();
        assert_eq!(
            k.calls(),
            &[
                KernelCall::Init,
                KernelCall::NotifyKeyDown(KeyCode(65)),
                KernelCall::AdvanceFrame,
            ]
        );
        assert_eq!(k.frames(), 1);
        assert!(k.violations().is_empty());
    }

    #[test]
    fn injected_faults() {
        let mut k = RecordingKernel::new().fail_on(KernelCall::NotifyKeyUp(KeyCode(9)));
        k.init().unwrap();
        assert!(k.notify_key_up(KeyCode(9)).is_err());
        assert!(k.notify_key_up(KeyCode(10)).is_ok());
        assert!(RecordingKernel::new().fail_init().init().is_err());
    }

    #[test]
    fn flags_contract_violations() {
        let mut k = RecordingKernel::new();
        k.advance_frame().unwrap();
        k.init().unwrap();
        k.init().unwrap();
        assert_eq!(
            k.violations(),
            &["advance_frame() before init", "init called twice"]
        );

        let mut failed = RecordingKernel::new().fail_init();
        let _ = failed.init();
        let _ = failed.notify_key_down(KeyCode(1));
        assert_eq!(failed.violations(), &["notify_key_down(1) after failed init"]);
    }
}
