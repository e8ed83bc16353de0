use serde::{Deserialize, Serialize};

use maze::{ENTITY_RADIUS, TICK_INTERVAL_MS};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("tick interval must be at least 1 ms")]
    ZeroTickInterval,
    #[error("phase duration must be positive")]
    ZeroPhaseDuration,
    #[error("entity radius {0} must lie in (0, 0.5)")]
    InvalidEntityRadius(f32),
    #[error("slow factor {0} must lie in [0, 1]")]
    InvalidSlowFactor(f32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub tick_interval_ms: u64,
    pub phase_duration_ms: u64,
    pub players: u32,
    pub traps: u32,
    pub trap_radius: f32,
    pub entity_radius: f32,
    /// Normalized maze units per millisecond.
    pub base_speed: f32,
    /// Speed multiplier while a slow debuff is active.
    pub slow_factor: f32,
    pub seed: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: TICK_INTERVAL_MS,
            phase_duration_ms: 60_000,
            players: 8,
            traps: 12,
            trap_radius: 0.02,
            entity_radius: ENTITY_RADIUS,
            base_speed: 0.0003,
            slow_factor: 0.5,
            seed: 0x5EED,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        if self.phase_duration_ms == 0 {
            return Err(ConfigError::ZeroPhaseDuration);
        }
        if !(self.entity_radius > 0.0 && self.entity_radius < 0.5) {
            return Err(ConfigError::InvalidEntityRadius(self.entity_radius));
        }
        if !(0.0..=1.0).contains(&self.slow_factor) {
            return Err(ConfigError::InvalidSlowFactor(self.slow_factor));
        }
        Ok(())
    }

    pub fn trap_reach(&self) -> f32 {
        self.trap_radius + self.entity_radius
    }
}
