//! Report emission rate limiter.

/// Opens once every `interval` frames, starting with the first frame.
///
/// Only gates what is shown; the tracking state advances every frame.
#[derive(Debug, Clone)]
pub struct EmissionCadence {
    interval: u32,
    count: u32,
}

impl EmissionCadence {
    /// An `interval` of 0 is treated as 1 (emit every frame).
    pub fn new(interval: u32) -> Self {
        Self {
            interval: interval.max(1),
            count: 0,
        }
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Returns whether this frame emits, then advances the counter.
    pub fn tick(&mut self) -> bool {
        let open = self.count == 0;
        self.count = (self.count + 1) % self.interval;
        open
    }
}
