mod protocol;
mod simulator;
mod stats;

pub use protocol::sequence_greater_than;
pub use protocol::{
    DEFAULT_TICK_RATE, ENTITY_RADIUS, EntityState, MAX_PACKET_SIZE, PROTOCOL_MAGIC,
    PROTOCOL_VERSION, Packet, PacketError, PacketHeader, PacketType, SnapshotBatch,
    TICK_INTERVAL_MS,
};
pub use simulator::NetworkSimulator;
pub use stats::{NetworkStats, PacketLossSimulation};
