use harness_common::KeyCode;
use harness_kernel::KernelCall;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One thing a host can report to the bridge.
///
/// Text form: `down:65`, `up:65`, `wake`. JSON form:
/// `{"event":"key_down","code":65}`, `{"event":"wake"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "code", rename_all = "snake_case")]
pub enum HostEvent {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    /// The host fires the outstanding wake, if any.
    Wake,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("unknown host event `{0}` (expected down:<code>, up:<code> or wake)")]
    UnknownEvent(String),
    #[error("invalid key code in `{0}`")]
    InvalidCode(String),
}

impl HostEvent {
    /// The kernel call this event turns into when the bridge is running.
    pub fn kernel_call(self) -> KernelCall {
        match self {
            Self::KeyDown(code) => KernelCall::NotifyKeyDown(code),
            Self::KeyUp(code) => KernelCall::NotifyKeyUp(code),
            Self::Wake => KernelCall::AdvanceFrame,
        }
    }
}

impl FromStr for HostEvent {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        if token.eq_ignore_ascii_case("wake") {
            return Ok(Self::Wake);
        }

        let (kind, code) = token
            .split_once(':')
            .ok_or_else(|| ScriptError::UnknownEvent(token.to_string()))?;
        let code: u32 = code
            .trim()
            .parse()
            .map_err(|_| ScriptError::InvalidCode(token.to_string()))?;

        match kind.trim().to_ascii_lowercase().as_str() {
            "down" => Ok(Self::KeyDown(KeyCode(code))),
            "up" => Ok(Self::KeyUp(KeyCode(code))),
            _ => Err(ScriptError::UnknownEvent(token.to_string())),
        }
    }
}

impl fmt::Display for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyDown(code) => write!(f, "down:{code}"),
            Self::KeyUp(code) => write!(f, "up:{code}"),
            Self::Wake => write!(f, "wake"),
        }
    }
}

/// Parse a comma- or whitespace-separated list of host events.
pub fn parse_script(script: &str) -> Result<Vec<HostEvent>, ScriptError> {
    script
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(str::parse)
        .collect()
}
