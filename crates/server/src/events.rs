use maze::{EffectState, EntityId};

#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    PhaseStarted {
        phase: u32,
        ends_at_ms: u64,
    },
    TrapTriggered {
        player_id: EntityId,
        trap_id: u32,
        effect: EffectState,
    },
    SlowExpired {
        player_id: EntityId,
    },
    Error {
        message: String,
    },
}
