use rkyv::{rancor, Archive, Deserialize, Serialize};

pub const MAX_PACKET_SIZE: usize = 1200;
pub const PROTOCOL_VERSION: u32 = 1;
pub const PROTOCOL_MAGIC: u32 = 0x4D415A45;

/// Fixed spacing between two server snapshots, in milliseconds.
pub const TICK_INTERVAL_MS: u64 = 50;
pub const DEFAULT_TICK_RATE: u32 = (1000 / TICK_INTERVAL_MS) as u32;

/// Half extent of a player in normalized maze units. Render positions never
/// get closer than this to the outer walls.
pub const ENTITY_RADIUS: f32 = 0.015;

const SEQUENCE_WRAP_THRESHOLD: u32 = u32::MAX / 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct PacketHeader {
    pub magic: u32,
    pub version: u32,
    pub sequence: u32,
}

impl PacketHeader {
    pub fn new(sequence: u32) -> Self {
        Self {
            magic: PROTOCOL_MAGIC,
            version: PROTOCOL_VERSION,
            sequence,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == PROTOCOL_MAGIC && self.version == PROTOCOL_VERSION
    }
}

#[inline]
pub fn sequence_greater_than(s1: u32, s2: u32) -> bool {
    ((s1 > s2) && (s1 - s2 <= SEQUENCE_WRAP_THRESHOLD))
        || ((s1 < s2) && (s2 - s1 > SEQUENCE_WRAP_THRESHOLD))
}

#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum PacketType {
    SnapshotBatch(SnapshotBatch),
    PhaseChange {
        phase: u32,
        started_at_ms: u64,
        ends_at_ms: u64,
    },
}

/// Wire form of one entity sample. Velocity stays in full precision since
/// normalized units per millisecond are far below any fixed-point step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct EntityState {
    pub entity_id: u32,
    pub timestamp_ms: u64,
    pub position: [f32; 2],
    pub angle: f32,
    pub velocity: [f32; 2],
    pub flags: u16,
}

impl EntityState {
    pub const FLAG_SLOWED: u16 = 1 << 0;

    pub fn new(entity_id: u32, timestamp_ms: u64) -> Self {
        Self {
            entity_id,
            timestamp_ms,
            ..Default::default()
        }
    }

    #[inline]
    pub fn has_flag(&self, flag: u16) -> bool {
        self.flags & flag != 0
    }

    #[inline]
    pub fn set_flag(&mut self, flag: u16, value: bool) {
        if value {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }
}

#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct SnapshotBatch {
    pub tick: u32,
    pub server_time_ms: u64,
    pub entities: Vec<EntityState>,
}

impl SnapshotBatch {
    pub fn new(tick: u32, server_time_ms: u64) -> Self {
        Self {
            tick,
            server_time_ms,
            entities: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Packet {
    pub header: PacketHeader,
    pub payload: PacketType,
}

#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
    #[error("invalid header (magic {magic:#010x}, version {version})")]
    InvalidHeader { magic: u32, version: u32 },
}

impl Packet {
    pub fn new(header: PacketHeader, payload: PacketType) -> Self {
        Self { header, payload }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, PacketError> {
        rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(PacketError::Serialize)
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, PacketError> {
        let packet =
            rkyv::from_bytes::<Self, rancor::Error>(data).map_err(PacketError::Deserialize)?;
        if !packet.header.is_valid() {
            return Err(PacketError::InvalidHeader {
                magic: packet.header.magic,
                version: packet.header.version,
            });
        }
        Ok(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_comparison() {
        assert!(sequence_greater_than(2, 1));
        assert!(!sequence_greater_than(1, 2));
        assert!(sequence_greater_than(0, u32::MAX));
        assert!(!sequence_greater_than(u32::MAX, 0));
    }

    #[test]
    fn test_snapshot_batch_serialization() {
        let mut batch = SnapshotBatch::new(7, 1_700_000_000_350);
        let mut state = EntityState::new(3, 1_700_000_000_350);
        state.position = [0.25, 0.75];
        state.angle = 1.5;
        state.velocity = [0.0002, -0.0001];
        state.set_flag(EntityState::FLAG_SLOWED, true);
        batch.entities.push(state);

        let packet = Packet::new(PacketHeader::new(7), PacketType::SnapshotBatch(batch));
        let bytes = packet.serialize().unwrap();
        assert!(bytes.len() < MAX_PACKET_SIZE);

        let decoded = Packet::deserialize(&bytes).unwrap();
        assert_eq!(decoded.header, packet.header);
        match decoded.payload {
            PacketType::SnapshotBatch(batch) => {
                assert_eq!(batch.tick, 7);
                assert_eq!(batch.entities.len(), 1);
                assert_eq!(batch.entities[0], state);
                assert!(batch.entities[0].has_flag(EntityState::FLAG_SLOWED));
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_rejects_foreign_header() {
        let mut header = PacketHeader::new(1);
        header.magic = 0x4455414C;
        let payload = PacketType::PhaseChange {
            phase: 1,
            started_at_ms: 0,
            ends_at_ms: 60_000,
        };
        let packet = Packet::new(header, payload);
        let bytes = packet.serialize().unwrap();

        assert!(matches!(
            Packet::deserialize(&bytes),
            Err(PacketError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_garbage_fails_to_decode() {
        assert!(Packet::deserialize(&[0xFF; 5]).is_err());
    }
}
