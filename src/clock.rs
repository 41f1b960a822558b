/// Turns host timestamps (seconds, monotonic) into per-frame deltas.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameClock {
    last: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// The first tick after a reset only sets the baseline and yields zero.
    pub fn tick(&mut self, now_seconds: f64) -> f32 {
        if !now_seconds.is_finite() {
            return 0.0;
        }
        let delta = match self.last {
            Some(last) => (now_seconds - last).max(0.0),
            None => 0.0,
        };
        self.last = Some(now_seconds);
        delta as f32
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
