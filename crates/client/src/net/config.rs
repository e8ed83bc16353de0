use serde::{Deserialize, Serialize};

use maze::{ENTITY_RADIUS, TICK_INTERVAL_MS};

use super::interpolation::InterpolationConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub tick_interval_ms: u64,
    pub frame_rate: u32,
    pub entity_radius: f32,
    pub time_correction_rate: f64,
    /// Entities with no accepted sample for this long are dropped.
    pub entity_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: TICK_INTERVAL_MS,
            frame_rate: 60,
            entity_radius: ENTITY_RADIUS,
            time_correction_rate: 0.1,
            entity_timeout_ms: 1_000,
        }
    }
}

impl ClientConfig {
    /// Display clock time of frame number `frame`.
    pub fn frame_time_ms(&self, frame: u64) -> f64 {
        (frame * 1000) as f64 / self.frame_rate.max(1) as f64
    }

    pub fn interpolation(&self) -> InterpolationConfig {
        InterpolationConfig {
            tick_interval_ms: self.tick_interval_ms as f64,
            entity_radius: self.entity_radius,
            time_correction_rate: self.time_correction_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolation_config_follows_client_config() {
        let config = ClientConfig {
            tick_interval_ms: 40,
            entity_radius: 0.02,
            ..Default::default()
        };
        let interpolation = config.interpolation();

        assert_eq!(interpolation.tick_interval_ms, 40.0);
        assert_eq!(interpolation.entity_radius, 0.02);
    }

    #[test]
    fn test_frame_times_land_on_whole_seconds() {
        let config = ClientConfig::default();
        assert_eq!(config.frame_time_ms(60), 1_000.0);
        assert_eq!(config.frame_time_ms(480), 8_000.0);
    }
}
