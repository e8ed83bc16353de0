use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use maze::{
    EntityId, FixedTimestep, NetworkSimulator, NetworkStats, Packet, PacketError, PacketHeader,
    PacketLossSimulation, PacketType, SnapshotBatch, Walker,
};

use crate::frame::FrameScheduler;
use crate::net::{ClientConfig, ClientStats, InterpolationStats, SnapshotClient};

pub const REPLAY_EPOCH_MS: u64 = 1_700_000_000_000;

/// Headless run of a scripted server stream through a lossy link into the
/// client, driven frame by frame like a render loop would.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    pub client: ClientConfig,
    pub link: PacketLossSimulation,
    pub players: u32,
    pub duration_ms: u64,
    pub walk_speed: f32,
    /// Replay time at which the highest numbered player leaves the game.
    pub leave_at_ms: Option<u64>,
    pub seed: u64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            link: PacketLossSimulation::default(),
            players: 4,
            duration_ms: 10_000,
            walk_speed: 0.0004,
            leave_at_ms: None,
            seed: 0x5EED,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReplayReport {
    pub frames: u64,
    pub server_ticks: u64,
    pub network: NetworkStats,
    pub client: ClientStats,
    pub interpolation: InterpolationStats,
    pub departed: Vec<EntityId>,
    /// Frame subscriptions still live when the replay ended.
    pub subscribed: usize,
    pub min_rendered: Vec2,
    pub max_rendered: Vec2,
}

struct ScriptedServer {
    walkers: Vec<Walker>,
    timestep: FixedTimestep,
    speed: f32,
    radius: f32,
    leave_at_ms: Option<u64>,
    sequence: u32,
}

impl ScriptedServer {
    fn new(config: &ReplayConfig, rng: &mut StdRng) -> Self {
        let radius = config.client.entity_radius;
        let walkers = (0..config.players)
            .map(|_| {
                let position = Vec2::new(
                    rng.gen_range(radius..1.0 - radius),
                    rng.gen_range(radius..1.0 - radius),
                );
                Walker::new(position, rng.gen_range(-std::f32::consts::PI..std::f32::consts::PI))
            })
            .collect();

        Self {
            walkers,
            timestep: FixedTimestep::new(config.client.tick_interval_ms),
            speed: config.walk_speed,
            radius,
            leave_at_ms: config.leave_at_ms,
            sequence: 0,
        }
    }

    fn next_header(&mut self) -> PacketHeader {
        let header = PacketHeader::new(self.sequence);
        self.sequence = self.sequence.wrapping_add(1);
        header
    }

    fn phase_packet(&mut self, duration_ms: u64) -> Result<Vec<u8>, PacketError> {
        let header = self.next_header();
        Packet::new(
            header,
            PacketType::PhaseChange {
                phase: 1,
                started_at_ms: REPLAY_EPOCH_MS,
                ends_at_ms: REPLAY_EPOCH_MS + duration_ms,
            },
        )
        .serialize()
    }

    fn advance(&mut self, delta_ms: u64) -> Result<Vec<Vec<u8>>, PacketError> {
        self.timestep.accumulate(delta_ms);

        let mut datagrams = Vec::new();
        while self.timestep.consume_tick() {
            let dt = self.timestep.tick_interval_ms();
            for walker in &mut self.walkers {
                walker.step(self.speed, dt, self.radius);
            }

            let elapsed_ms = self.timestep.simulated_ms();
            if self.leave_at_ms.is_some_and(|leave_at| elapsed_ms >= leave_at) {
                self.leave_at_ms = None;
                self.walkers.pop();
            }

            let server_time_ms = REPLAY_EPOCH_MS + elapsed_ms;
            let mut batch = SnapshotBatch::new(self.timestep.ticks() as u32, server_time_ms);
            for (id, walker) in self.walkers.iter().enumerate() {
                batch
                    .entities
                    .push(walker.snapshot(server_time_ms).to_network_state(id as EntityId));
            }

            let header = self.next_header();
            datagrams.push(Packet::new(header, PacketType::SnapshotBatch(batch)).serialize()?);
        }
        Ok(datagrams)
    }
}

pub fn run(config: &ReplayConfig) -> Result<ReplayReport, PacketError> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut server = ScriptedServer::new(config, &mut rng);
    let mut link = NetworkSimulator::new(config.link.clone(), rng.r#gen());
    let mut client = SnapshotClient::new(config.client.clone());
    let mut scheduler: FrameScheduler<SnapshotClient> = FrameScheduler::new();

    let mut min_rendered = Vec2::ONE;
    let mut max_rendered = Vec2::ZERO;
    let mut frames = 0u64;
    let mut departed = Vec::new();
    let mut last_link_ms = 0u64;
    let mut next_report_ms = 1_000.0;

    link.send(server.phase_packet(config.duration_ms)?, 0);
    scheduler.start();

    loop {
        let frame_time = config.client.frame_time_ms(frames);
        if frame_time > config.duration_ms as f64 {
            break;
        }

        let link_ms = frame_time as u64;
        for datagram in server.advance(link_ms - last_link_ms)? {
            link.send(datagram, link_ms);
        }
        last_link_ms = link_ms;

        for bytes in link.receive(link_ms) {
            match client.receive(&bytes, frame_time) {
                Ok(new_entities) => {
                    for id in new_entities {
                        scheduler.subscribe(id, move |client: &mut SnapshotClient, t| {
                            client.refresh(id, t)
                        });
                    }
                }
                Err(e) => log::warn!("dropping undecodable datagram: {}", e),
            }
        }

        for id in client.stale_entities(frame_time) {
            scheduler.unsubscribe(id);
            client.forget(id);
            departed.push(id);
        }

        scheduler.tick(&mut client, frame_time);
        for (_, state) in client.render_states() {
            min_rendered = min_rendered.min(state.position);
            max_rendered = max_rendered.max(state.position);
        }

        if frame_time >= next_report_ms {
            let stats = client.interpolation_stats(frame_time);
            log::info!(
                "t={:.0}ms tracked={} accepted={} discarded={} extrapolating={}",
                frame_time,
                stats.tracked_entities,
                stats.accepted,
                stats.discarded,
                stats.extrapolating
            );
            next_report_ms += 1_000.0;
        }
        frames += 1;
    }

    scheduler.stop();
    let subscribed = scheduler.len();
    scheduler.clear();

    let end_time = config.client.frame_time_ms(frames.saturating_sub(1));
    Ok(ReplayReport {
        frames,
        server_ticks: server.timestep.ticks(),
        network: link.stats().clone(),
        client: client.stats().clone(),
        interpolation: client.interpolation_stats(end_time),
        departed,
        subscribed,
        min_rendered,
        max_rendered,
    })
}
