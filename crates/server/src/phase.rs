/// Back-to-back game phases of equal length.
#[derive(Debug, Clone)]
pub struct PhaseClock {
    phase: u32,
    started_at_ms: u64,
    duration_ms: u64,
}

impl PhaseClock {
    pub fn new(started_at_ms: u64, duration_ms: u64) -> Self {
        Self {
            phase: 1,
            started_at_ms,
            duration_ms: duration_ms.max(1),
        }
    }

    pub fn phase(&self) -> u32 {
        self.phase
    }

    pub fn started_at_ms(&self) -> u64 {
        self.started_at_ms
    }

    pub fn ends_at_ms(&self) -> u64 {
        self.started_at_ms + self.duration_ms
    }

    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.ends_at_ms().saturating_sub(now_ms)
    }

    /// Moves to the phase containing `now_ms`. Returns the new phase number
    /// if it changed.
    pub fn advance(&mut self, now_ms: u64) -> Option<u32> {
        if now_ms < self.ends_at_ms() {
            return None;
        }
        let skipped = (now_ms - self.started_at_ms) / self.duration_ms;
        self.phase += skipped as u32;
        self.started_at_ms += skipped * self.duration_ms;
        Some(self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stays_in_phase_until_the_deadline() {
        let mut clock = PhaseClock::new(1_000, 60_000);

        assert_eq!(clock.advance(60_999), None);
        assert_eq!(clock.phase(), 1);
        assert_eq!(clock.remaining_ms(31_000), 30_000);
    }

    #[test]
    fn test_rolls_over_at_the_deadline() {
        let mut clock = PhaseClock::new(1_000, 60_000);

        assert_eq!(clock.advance(61_000), Some(2));
        assert_eq!(clock.started_at_ms(), 61_000);
        assert_eq!(clock.ends_at_ms(), 121_000);
    }

    #[test]
    fn test_skips_whole_phases_after_a_stall() {
        let mut clock = PhaseClock::new(0, 100);

        assert_eq!(clock.advance(350), Some(4));
        assert_eq!(clock.started_at_ms(), 300);
    }
}
