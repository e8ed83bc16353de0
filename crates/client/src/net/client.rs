use std::collections::{HashMap, HashSet};

use maze::{
    EntityId, EntityState, Packet, PacketError, PacketType, RenderState, SnapshotBatch,
    net::sequence_greater_than,
};

use super::config::ClientConfig;
use super::interpolation::{InterpolationEngine, InterpolationStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseInfo {
    pub phase: u32,
    pub started_at_ms: u64,
    pub ends_at_ms: u64,
}

impl PhaseInfo {
    pub fn remaining_ms(&self, server_time_ms: u64) -> u64 {
        self.ends_at_ms.saturating_sub(server_time_ms)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClientStats {
    pub packets_received: u64,
    pub decode_errors: u64,
    pub out_of_order_packets: u64,
}

/// Client side of the snapshot stream: decodes packets, feeds the
/// interpolation engine and holds the last render state of every entity.
#[derive(Debug)]
pub struct SnapshotClient {
    config: ClientConfig,
    interpolation: InterpolationEngine,
    rendered: HashMap<EntityId, RenderState>,
    slowed: HashSet<EntityId>,
    phase: Option<PhaseInfo>,
    last_sequence: Option<u32>,
    stats: ClientStats,
}

impl SnapshotClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            interpolation: InterpolationEngine::new(config.interpolation()),
            config,
            rendered: HashMap::new(),
            slowed: HashSet::new(),
            phase: None,
            last_sequence: None,
            stats: ClientStats::default(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Decodes one datagram received at `frame_time_ms`. Returns the entities
    /// seen for the first time so the caller can start rendering them.
    pub fn receive(
        &mut self,
        bytes: &[u8],
        frame_time_ms: f64,
    ) -> Result<Vec<EntityId>, PacketError> {
        let packet = match Packet::deserialize(bytes) {
            Ok(packet) => packet,
            Err(e) => {
                self.stats.decode_errors += 1;
                return Err(e);
            }
        };
        self.stats.packets_received += 1;

        let sequence = packet.header.sequence;
        match self.last_sequence {
            Some(last) if !sequence_greater_than(sequence, last) => {
                self.stats.out_of_order_packets += 1;
            }
            _ => self.last_sequence = Some(sequence),
        }

        match packet.payload {
            PacketType::SnapshotBatch(batch) => Ok(self.handle_snapshot(&batch, frame_time_ms)),
            PacketType::PhaseChange {
                phase,
                started_at_ms,
                ends_at_ms,
            } => {
                self.handle_phase_change(PhaseInfo {
                    phase,
                    started_at_ms,
                    ends_at_ms,
                });
                Ok(Vec::new())
            }
        }
    }

    fn handle_snapshot(&mut self, batch: &SnapshotBatch, frame_time_ms: f64) -> Vec<EntityId> {
        let new_entities: Vec<EntityId> = batch
            .entities
            .iter()
            .map(|state| state.entity_id)
            .filter(|id| !self.interpolation.is_tracking(*id))
            .collect();

        let accepted = self.interpolation.push_batch(batch, frame_time_ms);
        if accepted > 0 {
            // Flags follow the newest accepted sample only.
            for state in &batch.entities {
                let is_latest = self
                    .interpolation
                    .track(state.entity_id)
                    .and_then(|pair| pair.latest())
                    .is_some_and(|latest| latest.timestamp_ms == state.timestamp_ms);
                if is_latest {
                    self.update_flags(state);
                }
            }
        }

        for id in &new_entities {
            log::info!("tracking entity {} from tick {}", id, batch.tick);
        }
        new_entities
    }

    fn update_flags(&mut self, state: &EntityState) {
        if state.has_flag(EntityState::FLAG_SLOWED) {
            self.slowed.insert(state.entity_id);
        } else {
            self.slowed.remove(&state.entity_id);
        }
    }

    fn handle_phase_change(&mut self, phase: PhaseInfo) {
        if self.phase.is_some_and(|current| current.phase >= phase.phase) {
            return;
        }
        log::info!(
            "phase {} running until {} ({} ms)",
            phase.phase,
            phase.ends_at_ms,
            phase.ends_at_ms.saturating_sub(phase.started_at_ms)
        );
        self.phase = Some(phase);
    }

    /// Per-frame update of one entity. Keeps the previous render state when
    /// the engine has nothing for it.
    pub fn refresh(&mut self, entity: EntityId, frame_time_ms: f64) {
        if let Some(state) = self.interpolation.render(entity, frame_time_ms) {
            self.rendered.insert(entity, state);
        }
    }

    /// Entities whose newest sample arrived more than `entity_timeout_ms`
    /// before `frame_time_ms`, in id order.
    pub fn stale_entities(&self, frame_time_ms: f64) -> Vec<EntityId> {
        let timeout = self.config.entity_timeout_ms as f64;
        let mut stale: Vec<EntityId> = self
            .interpolation
            .tracked()
            .filter(|&id| {
                self.interpolation
                    .last_arrival_ms(id)
                    .is_some_and(|arrived| frame_time_ms - arrived > timeout)
            })
            .collect();
        stale.sort_unstable();
        stale
    }

    pub fn forget(&mut self, entity: EntityId) {
        log::info!("entity {} left", entity);
        self.interpolation.remove_entity(entity);
        self.rendered.remove(&entity);
        self.slowed.remove(&entity);
    }

    pub fn render_state(&self, entity: EntityId) -> Option<&RenderState> {
        self.rendered.get(&entity)
    }

    pub fn render_states(&self) -> impl Iterator<Item = (&EntityId, &RenderState)> {
        self.rendered.iter()
    }

    pub fn is_slowed(&self, entity: EntityId) -> bool {
        self.slowed.contains(&entity)
    }

    pub fn phase(&self) -> Option<&PhaseInfo> {
        self.phase.as_ref()
    }

    pub fn interpolation(&self) -> &InterpolationEngine {
        &self.interpolation
    }

    pub fn interpolation_stats(&self, frame_time_ms: f64) -> InterpolationStats {
        self.interpolation.stats(frame_time_ms)
    }

    pub fn stats(&self) -> &ClientStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use maze::{PacketHeader, Snapshot};

    use super::*;

    const T0: u64 = 1_700_000_000_000;

    fn batch_bytes(
        sequence: u32,
        timestamp_ms: u64,
        states: &[(EntityId, Vec2, bool)],
    ) -> Vec<u8> {
        let mut batch = SnapshotBatch::new(sequence, timestamp_ms);
        for &(id, position, slowed) in states {
            let mut state = Snapshot::at_rest(timestamp_ms, position).to_network_state(id);
            state.set_flag(EntityState::FLAG_SLOWED, slowed);
            batch.entities.push(state);
        }
        Packet::new(PacketHeader::new(sequence), PacketType::SnapshotBatch(batch))
            .serialize()
            .unwrap()
    }

    #[test]
    fn test_client_reports_new_entities_once() {
        let mut client = SnapshotClient::new(ClientConfig::default());

        let first = client
            .receive(&batch_bytes(1, T0, &[(1, Vec2::splat(0.5), false)]), 0.0)
            .unwrap();
        let both = [(1, Vec2::splat(0.5), false), (2, Vec2::splat(0.2), false)];
        let second = client.receive(&batch_bytes(2, T0 + 50, &both), 50.0).unwrap();

        assert_eq!(first, vec![1]);
        assert_eq!(second, vec![2]);
    }

    #[test]
    fn test_refresh_keeps_last_state() {
        let mut client = SnapshotClient::new(ClientConfig::default());
        client.refresh(9, 0.0);
        assert!(client.render_state(9).is_none());

        client
            .receive(&batch_bytes(1, T0, &[(9, Vec2::new(0.3, 0.4), false)]), 0.0)
            .unwrap();
        client.refresh(9, 16.0);
        assert_eq!(client.render_state(9).unwrap().position, Vec2::new(0.3, 0.4));
    }

    #[test]
    fn test_slow_flag_tracks_newest_sample() {
        let mut client = SnapshotClient::new(ClientConfig::default());
        client
            .receive(&batch_bytes(2, T0 + 50, &[(1, Vec2::splat(0.5), true)]), 0.0)
            .unwrap();
        assert!(client.is_slowed(1));

        // Late packet with an older sample must not clear the flag.
        client
            .receive(&batch_bytes(1, T0, &[(1, Vec2::splat(0.5), false)]), 1.0)
            .unwrap();
        assert!(client.is_slowed(1));
        assert_eq!(client.stats().out_of_order_packets, 1);

        client
            .receive(&batch_bytes(3, T0 + 100, &[(1, Vec2::splat(0.5), false)]), 2.0)
            .unwrap();
        assert!(!client.is_slowed(1));
    }

    #[test]
    fn test_phase_change_ignores_older_phases() {
        let mut client = SnapshotClient::new(ClientConfig::default());
        let phase = |phase, sequence| {
            Packet::new(
                PacketHeader::new(sequence),
                PacketType::PhaseChange {
                    phase,
                    started_at_ms: T0,
                    ends_at_ms: T0 + 60_000,
                },
            )
            .serialize()
            .unwrap()
        };

        client.receive(&phase(2, 10), 0.0).unwrap();
        client.receive(&phase(1, 9), 0.0).unwrap();

        let current = client.phase().unwrap();
        assert_eq!(current.phase, 2);
        assert_eq!(current.remaining_ms(T0 + 15_000), 45_000);
    }

    #[test]
    fn test_silent_entities_go_stale_and_are_forgotten() {
        let mut client = SnapshotClient::new(ClientConfig::default());
        let both = [(1, Vec2::splat(0.5), true), (2, Vec2::splat(0.2), false)];
        client.receive(&batch_bytes(1, T0, &both), 0.0).unwrap();
        client
            .receive(&batch_bytes(2, T0 + 50, &[(2, Vec2::splat(0.2), false)]), 600.0)
            .unwrap();
        client.refresh(1, 600.0);

        assert!(client.stale_entities(1_000.0).is_empty());
        assert_eq!(client.stale_entities(1_001.0), vec![1]);

        client.forget(1);
        assert!(client.render_state(1).is_none());
        assert!(!client.is_slowed(1));
        assert!(!client.interpolation().is_tracking(1));
        assert!(client.stale_entities(1_500.0).is_empty());

        // A returning entity is reported as new again.
        let back = client
            .receive(&batch_bytes(3, T0 + 100, &[(1, Vec2::splat(0.4), false)]), 1_600.0)
            .unwrap();
        assert_eq!(back, vec![1]);
    }

    #[test]
    fn test_decode_errors_are_counted() {
        let mut client = SnapshotClient::new(ClientConfig::default());
        assert!(client.receive(&[1, 2, 3], 0.0).is_err());
        assert_eq!(client.stats().decode_errors, 1);
        assert_eq!(client.stats().packets_received, 0);
    }
}
