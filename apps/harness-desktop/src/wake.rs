use harness_bridge::WakeSource;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::window::Window;

/// Refresh interval used when the monitor does not report one.
pub const FALLBACK_REFRESH: Duration = Duration::from_micros(16_667);

/// One-shot wake gate paced to the display refresh interval.
///
/// A requested wake is released at most once per interval. Nothing is
/// released without a request, so a slow frame pushes the next one back
/// instead of building a backlog.
#[derive(Debug)]
pub struct RefreshGate {
    interval: Duration,
    last_release: Option<Instant>,
    requested: bool,
    released: bool,
}

impl RefreshGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_release: None,
            requested: false,
            released: false,
        }
    }

    pub fn request(&mut self) {
        self.requested = true;
    }

    /// Release the pending request if its slot has come.
    ///
    /// Returns `Ok(true)` when released, `Ok(false)` when nothing is pending,
    /// and `Err(due)` when a request is waiting for `due`.
    pub fn poll(&mut self, now: Instant) -> Result<bool, Instant> {
        if !self.requested {
            return Ok(false);
        }
        if let Some(due) = self.last_release.map(|last| last + self.interval) {
            if now < due {
                return Err(due);
            }
        }
        self.requested = false;
        self.released = true;
        self.last_release = Some(now);
        Ok(true)
    }

    /// Consume a released wake. Redraws the gate did not release return false.
    pub fn take_released(&mut self) -> bool {
        std::mem::take(&mut self.released)
    }
}

/// Wake source backed by the window's redraw request.
pub struct RedrawWake {
    window: Arc<Window>,
    gate: RefreshGate,
}

impl RedrawWake {
    pub fn new(window: Arc<Window>) -> Self {
        let interval = window
            .current_monitor()
            .and_then(|m| m.refresh_rate_millihertz())
            .filter(|mhz| *mhz > 0)
            .map(|mhz| Duration::from_secs_f64(1000.0 / f64::from(mhz)))
            .unwrap_or(FALLBACK_REFRESH);
        tracing::debug!(?interval, "display refresh interval");
        Self {
            window,
            gate: RefreshGate::new(interval),
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Called when the event loop goes idle. Returns when to look again.
    pub fn poll(&mut self) -> Option<Instant> {
        match self.gate.poll(Instant::now()) {
            Ok(true) => {
                self.window.request_redraw();
                None
            }
            Ok(false) => None,
            Err(due) => Some(due),
        }
    }

    pub fn take_released(&mut self) -> bool {
        self.gate.take_released()
    }
}

impl WakeSource for RedrawWake {
    fn request_wake(&mut self) {
        self.gate.request();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_released_without_a_request() {
        let mut gate = RefreshGate::new(FALLBACK_REFRESH);
        assert_eq!(gate.poll(Instant::now()), Ok(false));
        assert!(!gate.take_released());
    }

    #[test]
    fn one_release_per_request() {
        let mut gate = RefreshGate::new(Duration::ZERO);
        let now = Instant::now();
        gate.request();
        assert_eq!(gate.poll(now), Ok(true));
        assert_eq!(gate.poll(now), Ok(false));
        assert!(gate.take_released());
        assert!(!gate.take_released());
    }

    #[test]
    fn paced_to_the_interval() {
        let interval = Duration::from_millis(16);
        let mut gate = RefreshGate::new(interval);
        let t0 = Instant::now();
        gate.request();
        assert_eq!(gate.poll(t0), Ok(true));

        gate.request();
        assert_eq!(gate.poll(t0 + Duration::from_millis(5)), Err(t0 + interval));
        assert_eq!(gate.poll(t0 + interval), Ok(true));
    }
}
