//! Input/Frame Bridge: keyboard events and display-paced frame ticks delivered to one kernel.
//!
//! # Invariants
//! - `init` runs once at `start`; if it fails the scheduler never arms.
//! - Each wake produces exactly one `advance_frame`, which returns before the next wake is requested.
//! - Key events and frames reach the kernel in host order and never overlap.
//!
//! # Scheduling
//! Everything runs on the host's event thread. The host owns the wake-up
//! primitive (a redraw request, an animation-frame callback); the scheduler
//! only asks for one wake at a time through [`WakeSource`].

mod bridge;
mod pacing;
mod scheduler;
mod script;
mod wake;

pub use bridge::Bridge;
pub use pacing::FramePacing;
pub use scheduler::{FrameScheduler, SchedulerState, SchedulerStats, WakeOutcome};
pub use script::{HostEvent, ScriptError, parse_script};
pub use wake::{ManualWake, WakeSource};

pub fn crate_info() -> &'static str {
    "harness-bridge v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("bridge"));
    }
}
