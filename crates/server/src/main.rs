mod config;
mod effects;
mod events;
mod phase;
mod server;
mod simulation;

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::Parser;

use config::ServerConfig;
use events::ServerEvent;
use maze::{NetworkSimulator, PacketLossSimulation};
use server::GameServer;

#[derive(Parser)]
#[command(name = "maze-server")]
#[command(about = "Headless maze snapshot server")]
struct Args {
    #[arg(short, long, default_value_t = maze::TICK_INTERVAL_MS)]
    tick_interval: u64,

    #[arg(long, default_value_t = 60_000, help = "Length of one game phase in ms")]
    phase_duration: u64,

    #[arg(short, long, default_value_t = 8)]
    players: u32,

    #[arg(short, long, default_value_t = 12)]
    traps: u32,

    #[arg(long, default_value_t = 0x5EED)]
    seed: u64,

    #[arg(short, long, help = "Stop after this many seconds")]
    seconds: Option<u64>,

    #[arg(long, help = "Route outgoing packets through the loss simulator")]
    simulate_packet_loss: bool,

    #[arg(long, default_value_t = 0.0, help = "Packet loss percentage (0-100)")]
    loss_percent: f32,

    #[arg(long, default_value_t = 0, help = "Minimum latency in ms")]
    min_latency: u32,

    #[arg(long, default_value_t = 0, help = "Maximum latency in ms")]
    max_latency: u32,

    #[arg(long, default_value_t = 0, help = "Jitter in ms")]
    jitter: u32,
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig {
        tick_interval_ms: args.tick_interval,
        phase_duration_ms: args.phase_duration,
        players: args.players,
        traps: args.traps,
        seed: args.seed,
        ..Default::default()
    };
    let epoch_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before the unix epoch")?
        .as_millis() as u64;

    let mut server = GameServer::new(config, epoch_ms).context("invalid server config")?;
    let mut link = args.simulate_packet_loss.then(|| {
        let sim = PacketLossSimulation {
            enabled: true,
            loss_percent: args.loss_percent,
            min_latency_ms: args.min_latency,
            max_latency_ms: args.max_latency,
            jitter_ms: args.jitter,
            ..Default::default()
        };
        NetworkSimulator::new(sim, args.seed)
    });

    log::info!(
        "Server started: {} players, {} traps, {} ms ticks",
        server.players().len(),
        server.traps().len(),
        server.config().tick_interval_ms
    );

    let started = Instant::now();
    let limit = args.seconds.map(Duration::from_secs);
    let running = server.running();
    let mut last_report = Instant::now();
    let mut delivered = 0u64;

    while running.load(Ordering::SeqCst) {
        if limit.is_some_and(|limit| started.elapsed() >= limit) {
            server.stop();
            break;
        }

        server.tick_once();
        log_events(&mut server);

        let now_ms = server.server_time_ms();
        let outgoing: Vec<Vec<u8>> = server.drain_outgoing().collect();
        match link.as_mut() {
            Some(link) => {
                for bytes in outgoing {
                    link.send(bytes, now_ms);
                }
                delivered += link.receive(now_ms).len() as u64;
            }
            None => delivered += outgoing.len() as u64,
        }

        if last_report.elapsed() >= Duration::from_secs(1) {
            last_report = Instant::now();
            let stats = server.stats();
            log::info!(
                "tick {} phase {}: {}/{} players slowed, {} traps triggered, {} packets delivered",
                stats.tick,
                stats.phase,
                stats.slowed_players,
                stats.players,
                stats.traps_triggered,
                delivered
            );
            if let Some(link) = &link {
                log::info!("simulated loss {:.1}%", link.stats().loss_percent());
            }
        }

        std::thread::sleep(Duration::from_millis(1));
    }

    log::info!(
        "Server shutting down after {} ticks ({} bytes queued)",
        server.stats().tick,
        server.stats().bytes_queued
    );
    Ok(())
}

fn log_events(server: &mut GameServer) {
    for event in server.drain_events() {
        match event {
            ServerEvent::PhaseStarted { phase, ends_at_ms } => {
                log::info!("Phase {} started, ends at {}", phase, ends_at_ms);
            }
            ServerEvent::TrapTriggered {
                player_id,
                trap_id,
                effect,
            } => {
                log::info!(
                    "Player {} hit trap {}: slowed until {} (+{} ms)",
                    player_id,
                    trap_id,
                    effect.slow_until_ms,
                    effect.duration_ms
                );
            }
            ServerEvent::SlowExpired { player_id } => {
                log::debug!("Player {} is no longer slowed", player_id);
            }
            ServerEvent::Error { message } => {
                log::error!("{}", message);
            }
        }
    }
}
