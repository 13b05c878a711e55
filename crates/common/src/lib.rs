//! Shared vocabulary: the transient values that flow from the host into the kernel.
//!
//! # Invariants
//! - Events are created at capture time and consumed by a single kernel call.
//! - Nothing here is stored by the bridge.

mod types;

pub use types::{FrameTick, KeyCode, KeyDirection, KeyEvent};
