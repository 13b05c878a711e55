/// Host primitive that calls the scheduler back once, before the next repaint.
///
/// Implementations request a single wake per call; the scheduler re-requests
/// after every firing. Never back this with a fixed-interval timer.
pub trait WakeSource {
    fn request_wake(&mut self);
}

impl<W: WakeSource + ?Sized> WakeSource for Box<W> {
    fn request_wake(&mut self) {
        (**self).request_wake();
    }
}

/// Wake source whose wakes are fired by hand. Used by scripted hosts and tests.
#[derive(Debug, Default)]
pub struct ManualWake {
    outstanding: bool,
    requested: u64,
}

impl ManualWake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a wake has been requested and not yet fired.
    pub fn is_pending(&self) -> bool {
        self.outstanding
    }

    /// Total wake requests seen.
    pub fn requested(&self) -> u64 {
        self.requested
    }

    /// Consume the outstanding request. Returns false when nothing was requested.
    pub fn fire(&mut self) -> bool {
        std::mem::take(&mut self.outstanding)
    }
}

impl WakeSource for ManualWake {
    fn request_wake(&mut self) {
        self.outstanding = true;
        self.requested += 1;
    }
}
