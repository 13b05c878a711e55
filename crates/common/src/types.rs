use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer key identifier as reported by the host (legacy DOM `keyCode` values).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub u32);

impl KeyCode {
    /// Code hosts report when they cannot identify the physical key.
    pub const UNIDENTIFIED: KeyCode = KeyCode(0);

    pub fn new(code: u32) -> Self {
        Self(code)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for KeyCode {
    fn from(code: u32) -> Self {
        Self(code)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a key transitioned to pressed or released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyDirection {
    Down,
    Up,
}

/// A single key transition, normalized from a host keyboard interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub direction: KeyDirection,
}

impl KeyEvent {
    pub fn down(code: KeyCode) -> Self {
        Self {
            code,
            direction: KeyDirection::Down,
        }
    }

    pub fn up(code: KeyCode) -> Self {
        Self {
            code,
            direction: KeyDirection::Up,
        }
    }

    pub fn is_down(&self) -> bool {
        self.direction == KeyDirection::Down
    }
}

/// Signal that one display frame has elapsed. Carries no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameTick;
