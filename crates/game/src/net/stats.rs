use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PacketLossSimulation {
    pub enabled: bool,
    pub loss_percent: f32,
    pub duplicate_percent: f32,
    pub min_latency_ms: u32,
    pub max_latency_ms: u32,
    pub jitter_ms: u32,
}

impl PacketLossSimulation {
    pub fn should_drop<R: Rng>(&self, rng: &mut R) -> bool {
        if !self.enabled || self.loss_percent <= 0.0 {
            return false;
        }
        rng.gen_range(0.0..100.0) < self.loss_percent
    }

    pub fn should_duplicate<R: Rng>(&self, rng: &mut R) -> bool {
        if !self.enabled || self.duplicate_percent <= 0.0 {
            return false;
        }
        rng.gen_range(0.0..100.0) < self.duplicate_percent
    }

    pub fn delay_ms<R: Rng>(&self, rng: &mut R) -> u32 {
        if !self.enabled || self.max_latency_ms == 0 {
            return 0;
        }
        let base = self.min_latency_ms;
        let range = self.max_latency_ms.saturating_sub(self.min_latency_ms);
        let jitter = if self.jitter_ms > 0 {
            rng.gen_range(0..=self.jitter_ms)
        } else {
            0
        };
        base + rng.gen_range(0..=range) + jitter
    }
}

#[derive(Debug, Clone, Default)]
pub struct NetworkStats {
    pub packets_sent: u64,
    pub packets_dropped: u64,
    pub packets_duplicated: u64,
    pub packets_delivered: u64,
    pub bytes_sent: u64,
}

impl NetworkStats {
    pub fn loss_percent(&self) -> f32 {
        if self.packets_sent == 0 {
            return 0.0;
        }
        self.packets_dropped as f32 / self.packets_sent as f32 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_disabled_simulation_is_transparent() {
        let sim = PacketLossSimulation {
            enabled: false,
            loss_percent: 100.0,
            duplicate_percent: 100.0,
            min_latency_ms: 10,
            max_latency_ms: 20,
            jitter_ms: 5,
        };
        let mut rng = StdRng::seed_from_u64(1);

        assert!(!sim.should_drop(&mut rng));
        assert!(!sim.should_duplicate(&mut rng));
        assert_eq!(sim.delay_ms(&mut rng), 0);
    }

    #[test]
    fn test_delay_stays_within_configured_window() {
        let sim = PacketLossSimulation {
            enabled: true,
            min_latency_ms: 30,
            max_latency_ms: 60,
            jitter_ms: 15,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..1000 {
            let delay = sim.delay_ms(&mut rng);
            assert!((30..=75).contains(&delay));
        }
    }
}
