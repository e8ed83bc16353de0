use std::collections::HashMap;

use glam::Vec2;

use maze::{
    ENTITY_RADIUS, NetworkSimulator, Packet, PacketHeader, PacketLossSimulation, PacketType,
    Snapshot, SnapshotBatch, SnapshotPair, TICK_INTERVAL_MS, Walker,
};

const EPOCH_MS: u64 = 1_700_000_000_000;

fn encode_tick(tick: u32, walkers: &[Walker]) -> Vec<u8> {
    let server_time_ms = EPOCH_MS + tick as u64 * TICK_INTERVAL_MS;
    let mut batch = SnapshotBatch::new(tick, server_time_ms);
    for (id, walker) in walkers.iter().enumerate() {
        batch
            .entities
            .push(walker.snapshot(server_time_ms).to_network_state(id as u32));
    }
    Packet::new(PacketHeader::new(tick), PacketType::SnapshotBatch(batch))
        .serialize()
        .unwrap()
}

fn spawn_walkers(count: usize) -> Vec<Walker> {
    (0..count)
        .map(|i| Walker::new(Vec2::new(0.2 + 0.1 * i as f32, 0.5), 0.4 * i as f32))
        .collect()
}

#[test]
fn test_lossy_stream_keeps_pairs_ordered() {
    let config = PacketLossSimulation {
        enabled: true,
        loss_percent: 15.0,
        duplicate_percent: 10.0,
        min_latency_ms: 20,
        max_latency_ms: 80,
        jitter_ms: 60,
    };
    let mut link = NetworkSimulator::new(config, 0xC0FFEE);
    let mut walkers = spawn_walkers(4);
    let mut pairs: HashMap<u32, SnapshotPair> = HashMap::new();
    let mut accepted = 0;
    let mut rejected = 0;

    for tick in 0..400u32 {
        for walker in &mut walkers {
            walker.step(0.0004, TICK_INTERVAL_MS, ENTITY_RADIUS);
        }
        let now = EPOCH_MS + tick as u64 * TICK_INTERVAL_MS;
        link.send(encode_tick(tick, &walkers), now);

        for bytes in link.receive(now) {
            let packet = Packet::deserialize(&bytes).unwrap();
            let PacketType::SnapshotBatch(batch) = packet.payload else {
                panic!("expected snapshot batch");
            };
            for state in &batch.entities {
                let pair = pairs.entry(state.entity_id).or_default();
                if pair.push(Snapshot::from(state)) {
                    accepted += 1;
                } else {
                    rejected += 1;
                }
                if let Some((previous, latest)) = pair.interpolation_pair() {
                    assert!(previous.timestamp_ms < latest.timestamp_ms);
                }
            }
        }
    }

    assert_eq!(pairs.len(), 4);
    assert!(accepted > 0);
    assert!(rejected > 0, "duplicates and reordering should be rejected");
    assert!(link.stats().packets_dropped > 0);
}

#[test]
fn test_clean_link_accepts_every_sample() {
    let mut link = NetworkSimulator::new(PacketLossSimulation::default(), 1);
    let mut walkers = spawn_walkers(2);
    let mut pairs: HashMap<u32, SnapshotPair> = HashMap::new();

    for tick in 0..50u32 {
        for walker in &mut walkers {
            walker.step(0.0004, TICK_INTERVAL_MS, ENTITY_RADIUS);
        }
        let now = EPOCH_MS + tick as u64 * TICK_INTERVAL_MS;
        link.send(encode_tick(tick, &walkers), now);

        for bytes in link.receive(now) {
            let PacketType::SnapshotBatch(batch) = Packet::deserialize(&bytes).unwrap().payload
            else {
                panic!("expected snapshot batch");
            };
            for state in &batch.entities {
                assert!(pairs.entry(state.entity_id).or_default().push(Snapshot::from(state)));
            }
        }
    }

    let latest = pairs[&1].latest().unwrap();
    assert_eq!(latest.timestamp_ms, EPOCH_MS + 49 * TICK_INTERVAL_MS);
    assert_eq!(latest.position, walkers[1].position);
}
