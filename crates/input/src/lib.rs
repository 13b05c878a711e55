//! Input Capture: host keyboard interrupts normalized into key codes and forwarded to the kernel.
//!
//! # Invariants
//! - Exactly one kernel call per host key event; repeats pass through untouched.
//! - Events reach the kernel in the order the host reported them.
//! - A faulted notification never unsubscribes the listener.

pub mod capture;
pub mod keymap;

pub use capture::{InputCapture, InputStats};
pub use keymap::dom_key_code;

pub fn crate_info() -> &'static str {
    "harness-input v0.1.0"
}
