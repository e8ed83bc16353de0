use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::net::EntityState;

pub type EntityId = u32;

/// Authoritative sample of one entity at one server tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp_ms: u64,
    pub position: Vec2,
    pub angle: f32,
    /// Normalized maze units per millisecond.
    pub velocity: Vec2,
}

impl Snapshot {
    pub fn new(timestamp_ms: u64, position: Vec2, angle: f32, velocity: Vec2) -> Self {
        Self {
            timestamp_ms,
            position,
            angle,
            velocity,
        }
    }

    pub fn at_rest(timestamp_ms: u64, position: Vec2) -> Self {
        Self::new(timestamp_ms, position, 0.0, Vec2::ZERO)
    }

    pub fn to_network_state(&self, entity_id: EntityId) -> EntityState {
        let mut state = EntityState::new(entity_id, self.timestamp_ms);
        state.position = self.position.into();
        state.angle = self.angle;
        state.velocity = self.velocity.into();
        state
    }
}

impl From<&EntityState> for Snapshot {
    fn from(state: &EntityState) -> Self {
        Self {
            timestamp_ms: state.timestamp_ms,
            position: Vec2::from(state.position),
            angle: state.angle,
            velocity: Vec2::from(state.velocity),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RenderState {
    pub position: Vec2,
    pub angle: f32,
}

impl RenderState {
    pub fn new(position: Vec2, angle: f32) -> Self {
        Self { position, angle }
    }
}

/// Keeps `position` at least `radius` away from every outer wall of the unit
/// maze square.
pub fn clamp_to_interior(position: Vec2, radius: f32) -> Vec2 {
    let min = Vec2::splat(radius);
    let max = Vec2::splat(1.0 - radius);
    position.clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_roundtrip() {
        let snapshot = Snapshot::new(1_000, Vec2::new(0.4, 0.6), -2.0, Vec2::new(0.0003, 0.0));

        let state = snapshot.to_network_state(42);
        assert_eq!(state.entity_id, 42);
        assert_eq!(Snapshot::from(&state), snapshot);
    }

    #[test]
    fn test_clamp_pulls_positions_off_the_walls() {
        let r = 0.05;
        assert_eq!(clamp_to_interior(Vec2::new(-0.3, 1.2), r), Vec2::new(0.05, 0.95));
        assert_eq!(clamp_to_interior(Vec2::new(0.5, 0.5), r), Vec2::new(0.5, 0.5));
    }
}
