use std::collections::HashMap;

use maze::{EffectState, EntityId, stack_slow};

/// Current slow debuff of every player. Each trigger is a full
/// read, stack, write cycle under `&mut self`, so simultaneous hits on one
/// player resolve one after another.
#[derive(Debug, Default)]
pub struct PlayerEffectStore {
    effects: HashMap<EntityId, EffectState>,
}

impl PlayerEffectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stacks a trap hit onto `player`'s debuff. An expired debuff does not
    /// count as an existing one.
    pub fn apply_trap(
        &mut self,
        player: EntityId,
        now_ms: u64,
        phase_ends_at_ms: u64,
    ) -> EffectState {
        let current = self
            .effects
            .get(&player)
            .filter(|effect| effect.is_active(now_ms))
            .map(|effect| effect.slow_until_ms);

        let effect = stack_slow(now_ms, phase_ends_at_ms, current);
        log::debug!(
            "player {} slowed until {} (+{} ms, stacked: {})",
            player,
            effect.slow_until_ms,
            effect.duration_ms,
            current.is_some()
        );
        self.effects.insert(player, effect);
        effect
    }

    pub fn get(&self, player: EntityId) -> Option<&EffectState> {
        self.effects.get(&player)
    }

    pub fn is_slowed(&self, player: EntityId, now_ms: u64) -> bool {
        self.effects
            .get(&player)
            .is_some_and(|effect| effect.is_active(now_ms))
    }

    /// Drops every debuff that has run out and returns the affected players.
    pub fn prune_expired(&mut self, now_ms: u64) -> Vec<EntityId> {
        let mut expired: Vec<EntityId> = self
            .effects
            .iter()
            .filter(|(_, effect)| !effect.is_active(now_ms))
            .map(|(&player, _)| player)
            .collect();
        expired.sort_unstable();

        for player in &expired {
            self.effects.remove(player);
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
