pub mod effect;
pub mod net;
pub mod simulation;
pub mod snapshot;

pub use effect::{EffectState, TRAP_EXTENSION_DIVISOR, stack_slow};
pub use net::{
    DEFAULT_TICK_RATE, ENTITY_RADIUS, EntityState, NetworkSimulator, NetworkStats,
    Packet, PacketError, PacketHeader, PacketLossSimulation, PacketType, SnapshotBatch,
    TICK_INTERVAL_MS,
};
pub use simulation::{FixedTimestep, Walker};
pub use snapshot::{EntityId, RenderState, Snapshot, SnapshotPair, clamp_to_interior};
