use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::stats::{NetworkStats, PacketLossSimulation};

#[derive(Debug)]
struct DelayedPayload {
    release_time_ms: u64,
    order: u64,
    bytes: Vec<u8>,
}

impl PartialEq for DelayedPayload {
    fn eq(&self, other: &Self) -> bool {
        self.release_time_ms == other.release_time_ms && self.order == other.order
    }
}

impl Eq for DelayedPayload {}

impl PartialOrd for DelayedPayload {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DelayedPayload {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .release_time_ms
            .cmp(&self.release_time_ms)
            .then_with(|| other.order.cmp(&self.order))
    }
}

/// One-way lossy link running on a caller-supplied clock. Drops, duplicates
/// and delays payloads; jitter larger than the send interval reorders them.
#[derive(Debug)]
pub struct NetworkSimulator {
    config: PacketLossSimulation,
    rng: StdRng,
    queue: BinaryHeap<DelayedPayload>,
    next_order: u64,
    stats: NetworkStats,
}

impl NetworkSimulator {
    pub fn new(config: PacketLossSimulation, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
            queue: BinaryHeap::new(),
            next_order: 0,
            stats: NetworkStats::default(),
        }
    }

    pub fn config(&self) -> &PacketLossSimulation {
        &self.config
    }

    pub fn set_config(&mut self, config: PacketLossSimulation) {
        self.config = config;
    }

    pub fn stats(&self) -> &NetworkStats {
        &self.stats
    }

    pub fn in_flight(&self) -> usize {
        self.queue.len()
    }

    pub fn send(&mut self, bytes: Vec<u8>, now_ms: u64) {
        self.stats.packets_sent += 1;
        self.stats.bytes_sent += bytes.len() as u64;

        if self.config.should_drop(&mut self.rng) {
            self.stats.packets_dropped += 1;
            log::trace!("dropped {} byte payload at {}", bytes.len(), now_ms);
            return;
        }

        if self.config.should_duplicate(&mut self.rng) {
            self.stats.packets_duplicated += 1;
            self.enqueue(bytes.clone(), now_ms);
        }
        self.enqueue(bytes, now_ms);
    }

    fn enqueue(&mut self, bytes: Vec<u8>, now_ms: u64) {
        let delay = self.config.delay_ms(&mut self.rng) as u64;
        self.queue.push(DelayedPayload {
            release_time_ms: now_ms + delay,
            order: self.next_order,
            bytes,
        });
        self.next_order += 1;
    }

    pub fn receive(&mut self, now_ms: u64) -> Vec<Vec<u8>> {
        let mut payloads = Vec::new();
        while let Some(delayed) = self.queue.peek() {
            if delayed.release_time_ms > now_ms {
                break;
            }
            if let Some(delayed) = self.queue.pop() {
                payloads.push(delayed.bytes);
            }
        }
        self.stats.packets_delivered += payloads.len() as u64;
        payloads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_delivers_in_send_order() {
        let mut sim = NetworkSimulator::new(PacketLossSimulation::default(), 0);
        sim.send(vec![1], 0);
        sim.send(vec![2], 0);
        sim.send(vec![3], 5);

        assert_eq!(sim.receive(0), vec![vec![1], vec![2]]);
        assert_eq!(sim.receive(5), vec![vec![3]]);
        assert_eq!(sim.stats().packets_delivered, 3);
    }

    #[test]
    fn test_latency_holds_payloads_back() {
        let config = PacketLossSimulation {
            enabled: true,
            min_latency_ms: 40,
            max_latency_ms: 40,
            ..Default::default()
        };
        let mut sim = NetworkSimulator::new(config, 0);
        sim.send(vec![9], 100);

        assert!(sim.receive(139).is_empty());
        assert_eq!(sim.in_flight(), 1);
        assert_eq!(sim.receive(140), vec![vec![9]]);
    }

    #[test]
    fn test_full_loss_drops_everything() {
        let config = PacketLossSimulation {
            enabled: true,
            loss_percent: 100.0,
            ..Default::default()
        };
        let mut sim = NetworkSimulator::new(config, 3);
        for i in 0..10 {
            sim.send(vec![i], i as u64);
        }

        assert!(sim.receive(1_000).is_empty());
        assert_eq!(sim.stats().packets_dropped, 10);
        assert!((sim.stats().loss_percent() - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_full_duplication_doubles_delivery() {
        let config = PacketLossSimulation {
            enabled: true,
            duplicate_percent: 100.0,
            ..Default::default()
        };
        let mut sim = NetworkSimulator::new(config, 3);
        sim.send(vec![4], 0);

        assert_eq!(sim.receive(0), vec![vec![4], vec![4]]);
    }
}
