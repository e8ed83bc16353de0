use clap::Parser;

use maze::PacketLossSimulation;
use maze_client::net::ClientConfig;
use maze_client::replay::{self, ReplayConfig};

#[derive(Parser)]
#[command(name = "maze-client")]
#[command(about = "Headless maze client replaying a simulated snapshot stream")]
struct Args {
    #[arg(short, long, default_value_t = 4)]
    players: u32,

    #[arg(short, long, default_value_t = 10, help = "Replay length in seconds")]
    seconds: u64,

    #[arg(long, default_value_t = 60)]
    frame_rate: u32,

    #[arg(long, default_value_t = 0x5EED)]
    seed: u64,

    #[arg(long, help = "Enable packet loss simulation")]
    simulate_packet_loss: bool,

    #[arg(long, default_value_t = 5.0, help = "Packet loss percentage (0-100)")]
    loss_percent: f32,

    #[arg(long, default_value_t = 2.0, help = "Duplicate percentage (0-100)")]
    duplicate_percent: f32,

    #[arg(long, default_value_t = 30, help = "Minimum latency in ms")]
    min_latency: u32,

    #[arg(long, default_value_t = 80, help = "Maximum latency in ms")]
    max_latency: u32,

    #[arg(long, default_value_t = 40, help = "Jitter in ms")]
    jitter: u32,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let link = PacketLossSimulation {
        enabled: args.simulate_packet_loss,
        loss_percent: args.loss_percent,
        duplicate_percent: args.duplicate_percent,
        min_latency_ms: args.min_latency,
        max_latency_ms: args.max_latency,
        jitter_ms: args.jitter,
    };

    let config = ReplayConfig {
        client: ClientConfig {
            frame_rate: args.frame_rate,
            ..Default::default()
        },
        link,
        players: args.players,
        duration_ms: args.seconds * 1_000,
        seed: args.seed,
        ..Default::default()
    };

    log::info!(
        "replaying {} players for {} s at {} fps",
        config.players,
        args.seconds,
        config.client.frame_rate
    );
    let report = replay::run(&config)?;

    log::info!(
        "{} frames, {} server ticks, {} datagrams sent, {} dropped, {} duplicated",
        report.frames,
        report.server_ticks,
        report.network.packets_sent,
        report.network.packets_dropped,
        report.network.packets_duplicated
    );
    log::info!(
        "snapshots accepted={} discarded={}, decode errors={}, out of order packets={}",
        report.interpolation.accepted,
        report.interpolation.discarded,
        report.client.decode_errors,
        report.client.out_of_order_packets
    );
    log::info!(
        "rendered bounds ({:.4}, {:.4}) .. ({:.4}, {:.4})",
        report.min_rendered.x,
        report.min_rendered.y,
        report.max_rendered.x,
        report.max_rendered.y
    );

    Ok(())
}
