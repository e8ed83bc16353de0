use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use maze::{
    EntityId, FixedTimestep, Packet, PacketError, PacketHeader, PacketType, SnapshotBatch,
};

use crate::config::{ConfigError, ServerConfig};
use crate::effects::PlayerEffectStore;
use crate::events::ServerEvent;
use crate::phase::PhaseClock;
use crate::simulation::{Player, Trap, detect_trap_entries, move_players};

#[derive(Debug, Clone, Default)]
pub struct ServerStats {
    pub tick: u64,
    pub phase: u32,
    pub players: usize,
    pub slowed_players: usize,
    pub traps_triggered: u64,
    pub bytes_queued: u64,
}

pub struct GameServer {
    config: ServerConfig,
    players: Vec<Player>,
    traps: Vec<Trap>,
    effects: PlayerEffectStore,
    phase: PhaseClock,
    timestep: FixedTimestep,
    epoch_ms: u64,
    send_sequence: u32,
    outgoing: VecDeque<Vec<u8>>,
    pending_events: VecDeque<ServerEvent>,
    running: Arc<AtomicBool>,
    last_tick_time: Instant,
    traps_triggered: u64,
    bytes_queued: u64,
}

impl GameServer {
    /// Builds a server whose clock starts at `epoch_ms` (server time of tick 0).
    pub fn new(config: ServerConfig, epoch_ms: u64) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let low = config.entity_radius;
        let high = 1.0 - config.entity_radius;

        let players = (0..config.players)
            .map(|id| {
                let position = Vec2::new(rng.gen_range(low..high), rng.gen_range(low..high));
                let heading = rng.gen_range(-std::f32::consts::PI..std::f32::consts::PI);
                Player::new(id, position, heading)
            })
            .collect();
        let traps = (0..config.traps)
            .map(|id| Trap {
                id,
                position: Vec2::new(rng.gen_range(low..high), rng.gen_range(low..high)),
            })
            .collect();

        let phase = PhaseClock::new(epoch_ms, config.phase_duration_ms);
        let mut server = Self {
            players,
            traps,
            effects: PlayerEffectStore::new(),
            timestep: FixedTimestep::new(config.tick_interval_ms),
            epoch_ms,
            send_sequence: 0,
            outgoing: VecDeque::new(),
            pending_events: VecDeque::new(),
            running: Arc::new(AtomicBool::new(true)),
            last_tick_time: Instant::now(),
            traps_triggered: 0,
            bytes_queued: 0,
            phase,
            config,
        };
        server.announce_phase();
        Ok(server)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn server_time_ms(&self) -> u64 {
        self.epoch_ms + self.timestep.simulated_ms()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn traps(&self) -> &[Trap] {
        &self.traps
    }

    pub fn phase(&self) -> &PhaseClock {
        &self.phase
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = ServerEvent> + '_ {
        self.pending_events.drain(..)
    }

    /// Encoded datagrams waiting for the transport.
    pub fn drain_outgoing(&mut self) -> impl Iterator<Item = Vec<u8>> + '_ {
        self.outgoing.drain(..)
    }

    /// Runs the ticks owed for the wall-clock time since the last call.
    pub fn tick_once(&mut self) -> u32 {
        let now = Instant::now();
        let delta = now - self.last_tick_time;
        let delta_ms = delta.as_millis() as u64;
        // Carry the sub-millisecond remainder into the next call.
        self.last_tick_time = now - (delta - Duration::from_millis(delta_ms));
        self.advance(delta_ms)
    }

    /// Advances simulated time by `delta_ms`, running every whole tick it covers.
    pub fn advance(&mut self, delta_ms: u64) -> u32 {
        self.timestep.accumulate(delta_ms);

        let mut ticks_run = 0;
        while self.timestep.consume_tick() {
            self.tick();
            ticks_run += 1;
        }
        ticks_run
    }

    fn tick(&mut self) {
        let now = self.server_time_ms();
        let dt = self.timestep.tick_interval_ms();

        if self.phase.advance(now).is_some() {
            self.announce_phase();
        }

        move_players(&mut self.players, &self.effects, &self.config, now, dt);
        self.resolve_traps(now);

        for player_id in self.effects.prune_expired(now) {
            self.pending_events
                .push_back(ServerEvent::SlowExpired { player_id });
        }

        self.broadcast_snapshot(now);
    }

    fn resolve_traps(&mut self, now: u64) {
        let entries = detect_trap_entries(&mut self.players, &self.traps, self.config.trap_reach());
        let phase_ends_at = self.phase.ends_at_ms();

        for (player_id, trap_id) in entries {
            let effect = self.effects.apply_trap(player_id, now, phase_ends_at);
            self.traps_triggered += 1;
            self.pending_events.push_back(ServerEvent::TrapTriggered {
                player_id,
                trap_id,
                effect,
            });
        }
    }

    fn broadcast_snapshot(&mut self, now: u64) {
        let mut batch = SnapshotBatch::new(self.timestep.ticks() as u32, now);
        for player in &self.players {
            let slowed = self.effects.is_slowed(player.id, now);
            batch.entities.push(player.to_network_state(now, slowed));
        }
        self.queue_packet(PacketType::SnapshotBatch(batch));
    }

    fn announce_phase(&mut self) {
        let payload = PacketType::PhaseChange {
            phase: self.phase.phase(),
            started_at_ms: self.phase.started_at_ms(),
            ends_at_ms: self.phase.ends_at_ms(),
        };
        self.pending_events.push_back(ServerEvent::PhaseStarted {
            phase: self.phase.phase(),
            ends_at_ms: self.phase.ends_at_ms(),
        });
        self.queue_packet(payload);
    }

    fn queue_packet(&mut self, payload: PacketType) {
        let header = PacketHeader::new(self.send_sequence);
        self.send_sequence = self.send_sequence.wrapping_add(1);

        match encode(header, payload) {
            Ok(bytes) => {
                self.bytes_queued += bytes.len() as u64;
                self.outgoing.push_back(bytes);
            }
            Err(e) => self.pending_events.push_back(ServerEvent::Error {
                message: format!("Failed to encode packet {}: {}", header.sequence, e),
            }),
        }
    }

    pub fn is_slowed(&self, player: EntityId) -> bool {
        self.effects.is_slowed(player, self.server_time_ms())
    }

    pub fn stats(&self) -> ServerStats {
        let now = self.server_time_ms();
        ServerStats {
            tick: self.timestep.ticks(),
            phase: self.phase.phase(),
            players: self.players.len(),
            slowed_players: self
                .players
                .iter()
                .filter(|p| self.effects.is_slowed(p.id, now))
                .count(),
            traps_triggered: self.traps_triggered,
            bytes_queued: self.bytes_queued,
        }
    }
}

fn encode(header: PacketHeader, payload: PacketType) -> Result<Vec<u8>, PacketError> {
    Packet::new(header, payload).serialize()
}
