use std::collections::HashSet;

use glam::Vec2;

use maze::{EntityId, EntityState, Snapshot, Walker};

use crate::config::ServerConfig;
use crate::effects::PlayerEffectStore;

#[derive(Debug, Clone)]
pub struct Player {
    pub id: EntityId,
    pub walker: Walker,
    /// Traps the player currently overlaps. A trap fires again only after
    /// the player has left it.
    pub touching: HashSet<u32>,
}

impl Player {
    pub fn new(id: EntityId, position: Vec2, heading: f32) -> Self {
        Self {
            id,
            walker: Walker::new(position, heading),
            touching: HashSet::new(),
        }
    }

    pub fn to_network_state(&self, timestamp_ms: u64, slowed: bool) -> EntityState {
        let mut state = self.snapshot(timestamp_ms).to_network_state(self.id);
        state.set_flag(EntityState::FLAG_SLOWED, slowed);
        state
    }

    pub fn snapshot(&self, timestamp_ms: u64) -> Snapshot {
        self.walker.snapshot(timestamp_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trap {
    pub id: u32,
    pub position: Vec2,
}

pub fn movement_speed(config: &ServerConfig, slowed: bool) -> f32 {
    if slowed {
        config.base_speed * config.slow_factor
    } else {
        config.base_speed
    }
}

pub fn move_players(
    players: &mut [Player],
    effects: &PlayerEffectStore,
    config: &ServerConfig,
    now_ms: u64,
    dt_ms: u64,
) {
    for player in players {
        let speed = movement_speed(config, effects.is_slowed(player.id, now_ms));
        player.walker.step(speed, dt_ms, config.entity_radius);
    }
}

/// Returns `(player, trap)` for every trap a player entered this tick.
pub fn detect_trap_entries(
    players: &mut [Player],
    traps: &[Trap],
    reach: f32,
) -> Vec<(EntityId, u32)> {
    let mut entries = Vec::new();
    for player in players {
        for trap in traps {
            let inside = player.walker.position.distance(trap.position) <= reach;
            if inside {
                if player.touching.insert(trap.id) {
                    entries.push((player.id, trap.id));
                }
            } else {
                player.touching.remove(&trap.id);
            }
        }
    }
    entries
}
