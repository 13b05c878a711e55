use crate::interface::{Kernel, KernelFault};
use harness_common::KeyCode;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// A sound the kernel asks the host to play. Ids fall in `0..100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundCue(pub u32);

/// Host callback that plays a cue.
pub type CueSink = Box<dyn FnMut(SoundCue)>;

/// Small stand-in kernel so the harness runs end to end.
///
/// Keeps wall-clock time across frames, tracks held keys, and emits a
/// pseudo-random sound cue on every key press. Cue ids come from a seeded
/// splitmix64 stream, so two kernels with the same seed and the same key
/// presses emit the same cues. Cues go to the host's [`CueSink`] when one is
/// set and are buffered otherwise.
pub struct DemoKernel {
    seed: u64,
    started: Option<Instant>,
    last_frame: Option<Instant>,
    elapsed: Duration,
    frames: u64,
    keys_held: BTreeSet<KeyCode>,
    cues: Vec<SoundCue>,
    sink: Option<CueSink>,
}

impl std::fmt::Debug for DemoKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemoKernel")
            .field("seed", &self.seed)
            .field("frames", &self.frames)
            .field("elapsed", &self.elapsed)
            .field("keys_held", &self.keys_held)
            .field("cues", &self.cues.len())
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl DemoKernel {
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            started: None,
            last_frame: None,
            elapsed: Duration::ZERO,
            frames: 0,
            keys_held: BTreeSet::new(),
            cues: Vec::new(),
            sink: None,
        }
    }

    /// Send cues to the host instead of buffering them.
    pub fn with_cue_sink(mut self, sink: impl FnMut(SoundCue) + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Frames advanced since init.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Sum of frame deltas since init.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn keys_held(&self) -> &BTreeSet<KeyCode> {
        &self.keys_held
    }

    /// Cues not yet drained by the host.
    pub fn cues(&self) -> &[SoundCue] {
        &self.cues
    }

    /// Take the pending cues. Useful for hosts that play them back.
    pub fn drain_cues(&mut self) -> Vec<SoundCue> {
        std::mem::take(&mut self.cues)
    }

    fn ensure_started(&self) -> Result<(), KernelFault> {
        if self.started.is_none() {
            return Err(KernelFault::new("kernel used before init"));
        }
        Ok(())
    }

    fn check_code(code: KeyCode) -> Result<(), KernelFault> {
        if code == KeyCode::UNIDENTIFIED {
            return Err(KernelFault::new(format!("unsupported key code {code}")));
        }
        Ok(())
    }
}

impl Default for DemoKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel for DemoKernel {
    fn init(&mut self) -> Result<(), KernelFault> {
        if self.started.is_some() {
            return Err(KernelFault::new("kernel already initialized"));
        }
        let now = Instant::now();
        self.started = Some(now);
        self.last_frame = Some(now);
        tracing::info!(seed = self.seed, "demo kernel initialized");
        Ok(())
    }

    fn notify_key_down(&mut self, code: KeyCode) -> Result<(), KernelFault> {
        self.ensure_started()?;
        Self::check_code(code)?;

        self.seed = splitmix64(self.seed);
        let cue = SoundCue((self.seed % 100) as u32);
        match self.sink.as_mut() {
            Some(sink) => sink(cue),
            None => self.cues.push(cue),
        }

        let repeat = !self.keys_held.insert(code);
        tracing::info!(%code, repeat, cue = cue.0, "key down");
        Ok(())
    }

    fn notify_key_up(&mut self, code: KeyCode) -> Result<(), KernelFault> {
        self.ensure_started()?;
        Self::check_code(code)?;
        self.keys_held.remove(&code);
        tracing::info!(%code, "key up");
        Ok(())
    }

    fn advance_frame(&mut self) -> Result<(), KernelFault> {
        self.ensure_started()?;
        let now = Instant::now();
        let dt = self.last_frame.map_or(Duration::ZERO, |last| now - last);
        self.last_frame = Some(now);
        self.elapsed += dt;
        self.frames += 1;
        tracing::trace!(frame = self.frames, ?dt, "frame advanced");
        Ok(())
    }
}

/// Splitmix64 step, used to draw reproducible cue ids.
fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_work_before_init() {
        let mut k = DemoKernel::new();
        assert!(k.advance_frame().is_err());
        assert!(k.notify_key_down(KeyCode(65)).is_err());
        assert_eq!(k.frames(), 0);
    }

    #[test]
    fn init_twice_faults() {
        let mut k = DemoKernel::new();
        k.init().unwrap();
        assert!(k.init().is_err());
    }

    #[test]
    fn frames_accumulate() {
        let mut k = DemoKernel::new();
        k.init().unwrap();
        for _ in 0..3 {
            k.advance_frame().unwrap();
        }
        assert_eq!(k.frames(), 3);
        assert!(k.elapsed() < Duration::from_secs(60));
    }

    #[test]
    fn held_keys_follow_transitions() {
        let mut k = DemoKernel::new();
        k.init().unwrap();
        k.notify_key_down(KeyCode(65)).unwrap();
        k.notify_key_down(KeyCode(65)).unwrap(); // auto-repeat
        k.notify_key_down(KeyCode(16)).unwrap();
        k.notify_key_up(KeyCode(65)).unwrap();
        assert_eq!(k.keys_held().iter().copied().collect::<Vec<_>>(), vec![KeyCode(16)]);
        assert_eq!(k.cues().len(), 3);
    }

    #[test]
    fn cues_are_reproducible_per_seed() {
        let press = |seed| {
            let mut k = DemoKernel::with_seed(seed);
            k.init().unwrap();
            for code in [65, 66, 67, 68] {
                k.notify_key_down(KeyCode(code)).unwrap();
            }
            k.drain_cues()
        };
        let a = press(42);
        assert_eq!(a, press(42));
        assert_ne!(a, press(7));
        assert!(a.iter().all(|c| c.0 < 100));
    }

    #[test]
    fn sink_receives_cues() {
        let played = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = std::rc::Rc::clone(&played);
        let mut k = DemoKernel::with_seed(3).with_cue_sink(move |cue| sink.borrow_mut().push(cue));
        k.init().unwrap();
        k.notify_key_down(KeyCode(32)).unwrap();
        assert_eq!(played.borrow().len(), 1);
        assert!(k.cues().is_empty());
    }

    #[test]
    fn unidentified_key_faults() {
        let mut k = DemoKernel::new();
        k.init().unwrap();
        let err = k.notify_key_down(KeyCode::UNIDENTIFIED).unwrap_err();
        assert!(err.message().contains("unsupported key code 0"));
        assert!(k.keys_held().is_empty());
        assert!(k.notify_key_down(KeyCode(65)).is_ok());
    }
}
