/// Accumulates frame deltas and hands out whole ticks of a fixed length.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    tick_interval_ms: u64,
    max_catch_up_ms: u64,
    accumulator_ms: u64,
    ticks: u64,
}

impl FixedTimestep {
    pub fn new(tick_interval_ms: u64) -> Self {
        Self {
            tick_interval_ms: tick_interval_ms.max(1),
            max_catch_up_ms: 250,
            accumulator_ms: 0,
            ticks: 0,
        }
    }

    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms
    }

    pub fn tick_rate(&self) -> f64 {
        1000.0 / self.tick_interval_ms as f64
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Elapsed simulated time covered by the ticks consumed so far.
    pub fn simulated_ms(&self) -> u64 {
        self.ticks * self.tick_interval_ms
    }

    pub fn accumulate(&mut self, delta_ms: u64) {
        self.accumulator_ms += delta_ms.min(self.max_catch_up_ms);
    }

    pub fn should_tick(&self) -> bool {
        self.accumulator_ms >= self.tick_interval_ms
    }

    pub fn consume_tick(&mut self) -> bool {
        if self.accumulator_ms >= self.tick_interval_ms {
            self.accumulator_ms -= self.tick_interval_ms;
            self.ticks += 1;
            true
        } else {
            false
        }
    }

    pub fn alpha(&self) -> f32 {
        self.accumulator_ms as f32 / self.tick_interval_ms as f32
    }

    pub fn reset(&mut self) {
        self.accumulator_ms = 0;
        self.ticks = 0;
    }
}
