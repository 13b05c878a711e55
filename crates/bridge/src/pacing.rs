use std::time::Duration;

/// Ring of recent `advance_frame` durations.
#[derive(Debug, Clone)]
pub struct FramePacing {
    history: Vec<Duration>,
    capacity: usize,
    index: usize,
    filled: bool,
    overruns: u64,
}

impl FramePacing {
    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: vec![Duration::ZERO; capacity],
            capacity,
            index: 0,
            filled: false,
            overruns: 0,
        }
    }

    pub fn record(&mut self, took: Duration) {
        self.history[self.index] = took;
        self.index = (self.index + 1) % self.capacity;
        if self.index == 0 {
            self.filled = true;
        }
    }

    pub(crate) fn note_overrun(&mut self) {
        self.overruns += 1;
    }

    /// Frames that took longer than the configured budget.
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    pub fn average(&self) -> Duration {
        let window = self.window();
        if window.is_empty() {
            return Duration::ZERO;
        }
        window.iter().sum::<Duration>() / window.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.window().iter().copied().max().unwrap_or(Duration::ZERO)
    }

    pub fn min(&self) -> Duration {
        self.window().iter().copied().min().unwrap_or(Duration::ZERO)
    }

    pub fn count(&self) -> usize {
        self.window().len()
    }

    fn window(&self) -> &[Duration] {
        let count = if self.filled { self.capacity } else { self.index };
        &self.history[..count]
    }
}

impl Default for FramePacing {
    fn default() -> Self {
        Self::new(120)
    }
}
