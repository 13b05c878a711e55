//! Kernel Interface: the contract the bridge drives, and the handle that serializes access to it.
//!
//! # Invariants
//! - Exactly one kernel call is in progress at any instant.
//! - `init` runs once, before every other call; a failed `init` refuses all later calls.
//! - Calls reach the kernel in the order they were dispatched.

pub mod demo;
pub mod handle;
pub mod interface;
pub mod recording;

pub use demo::{CueSink, DemoKernel, SoundCue};
pub use handle::{BridgeError, Delivery, HandleStats, KernelHandle, Lifecycle};
pub use interface::{Kernel, KernelCall, KernelFault};
pub use recording::RecordingKernel;

pub fn crate_info() -> &'static str {
    "harness-kernel v0.1.0"
}
