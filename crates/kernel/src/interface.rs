use harness_common::{KeyCode, KeyDirection, KeyEvent};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Any failure signaled by a kernel. Opaque to the bridge.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("kernel fault: {message}")]
pub struct KernelFault {
    message: String,
}

impl KernelFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The external compute module driven by the bridge.
///
/// Implementations are non-reentrant state machines: the bridge guarantees
/// that no method is entered while another one has not yet returned, and that
/// `init` is called once before anything else.
pub trait Kernel {
    /// One-time setup.
    fn init(&mut self) -> Result<(), KernelFault>;

    fn notify_key_down(&mut self, code: KeyCode) -> Result<(), KernelFault>;

    fn notify_key_up(&mut self, code: KeyCode) -> Result<(), KernelFault>;

    /// Advance simulation and render state by one logical frame.
    fn advance_frame(&mut self) -> Result<(), KernelFault>;
}

impl<K: Kernel + ?Sized> Kernel for Box<K> {
    fn init(&mut self) -> Result<(), KernelFault> {
        (**self).init()
    }

    fn notify_key_down(&mut self, code: KeyCode) -> Result<(), KernelFault> {
        (**self).notify_key_down(code)
    }

    fn notify_key_up(&mut self, code: KeyCode) -> Result<(), KernelFault> {
        (**self).notify_key_up(code)
    }

    fn advance_frame(&mut self) -> Result<(), KernelFault> {
        (**self).advance_frame()
    }
}

/// One invocation of the Kernel Interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "call", content = "code", rename_all = "snake_case")]
pub enum KernelCall {
    Init,
    NotifyKeyDown(KeyCode),
    NotifyKeyUp(KeyCode),
    AdvanceFrame,
}

impl KernelCall {
    /// Apply this call to a kernel.
    pub fn apply<K: Kernel + ?Sized>(self, kernel: &mut K) -> Result<(), KernelFault> {
        match self {
            Self::Init => kernel.init(),
            Self::NotifyKeyDown(code) => kernel.notify_key_down(code),
            Self::NotifyKeyUp(code) => kernel.notify_key_up(code),
            Self::AdvanceFrame => kernel.advance_frame(),
        }
    }

    pub fn is_init(self) -> bool {
        matches!(self, Self::Init)
    }
}

impl From<KeyEvent> for KernelCall {
    fn from(event: KeyEvent) -> Self {
        match event.direction {
            KeyDirection::Down => Self::NotifyKeyDown(event.code),
            KeyDirection::Up => Self::NotifyKeyUp(event.code),
        }
    }
}

impl fmt::Display for KernelCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init()"),
            Self::NotifyKeyDown(code) => write!(f, "notify_key_down({code})"),
            Self::NotifyKeyUp(code) => write!(f, "notify_key_up({code})"),
            Self::AdvanceFrame => write!(f, "advance_frame()"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_event_maps_to_call() {
        assert_eq!(
            KernelCall::from(KeyEvent::down(KeyCode(65))),
            KernelCall::NotifyKeyDown(KeyCode(65))
        );
        assert_eq!(
            KernelCall::from(KeyEvent::up(KeyCode(65))),
            KernelCall::NotifyKeyUp(KeyCode(65))
        );
    }

    #[test]
    fn display_reads_like_the_interface() {
        assert_eq!(KernelCall::Init.to_string(), "init()");
        assert_eq!(
            KernelCall::NotifyKeyDown(KeyCode(65)).to_string(),
            "notify_key_down(65)"
        );
        assert_eq!(KernelCall::AdvanceFrame.to_string(), "advance_frame()");
    }

    #[test]
    fn fault_message_is_preserved() {
        let fault = KernelFault::new("bad state");
        assert_eq!(fault.message(), "bad state");
        assert_eq!(fault.to_string(), "kernel fault: bad state");
    }
}
