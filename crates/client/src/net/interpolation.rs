use std::collections::HashMap;
use std::f32::consts::{PI, TAU};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use maze::{
    ENTITY_RADIUS, EntityId, RenderState, Snapshot, SnapshotBatch, SnapshotPair,
    TICK_INTERVAL_MS, clamp_to_interior,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpolationConfig {
    pub tick_interval_ms: f64,
    pub entity_radius: f32,
    /// Smoothing of the diagnostic server clock estimate. Rendering uses the
    /// per-entity arrival offset instead.
    pub time_correction_rate: f64,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: TICK_INTERVAL_MS as f64,
            entity_radius: ENTITY_RADIUS,
            time_correction_rate: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Only one sample known, shown as is.
    Snapped,
    Interpolated,
    /// Past the newest sample, dead-reckoned from its velocity.
    Extrapolated,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSample {
    pub state: RenderState,
    pub mode: RenderMode,
}

#[derive(Debug, Default)]
struct Track {
    pair: SnapshotPair,
    /// Frame time at which `latest` arrived.
    arrived_at_ms: f64,
}

#[derive(Debug)]
pub struct InterpolationEngine {
    config: InterpolationConfig,
    tracks: HashMap<EntityId, Track>,
    server_time_offset_ms: Option<f64>,
    newest_server_time_ms: u64,
    accepted: u64,
    discarded: u64,
}

impl InterpolationEngine {
    pub fn new(config: InterpolationConfig) -> Self {
        Self {
            config,
            tracks: HashMap::new(),
            server_time_offset_ms: None,
            newest_server_time_ms: 0,
            accepted: 0,
            discarded: 0,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(InterpolationConfig::default())
    }

    pub fn config(&self) -> &InterpolationConfig {
        &self.config
    }

    /// Feeds one sample for `entity` that arrived at `frame_time_ms` on the
    /// local frame clock. Returns `false` when the sample is not newer than
    /// the entity's latest one and was dropped.
    pub fn push_snapshot(
        &mut self,
        entity: EntityId,
        snapshot: Snapshot,
        frame_time_ms: f64,
    ) -> bool {
        let track = self.tracks.entry(entity).or_default();
        if !track.pair.push(snapshot) {
            self.discarded += 1;
            log::debug!(
                "discarded stale snapshot for entity {} at {}",
                entity,
                snapshot.timestamp_ms
            );
            return false;
        }

        track.arrived_at_ms = frame_time_ms;
        self.accepted += 1;
        self.observe_server_time(snapshot.timestamp_ms, frame_time_ms);
        true
    }

    pub fn push_batch(&mut self, batch: &SnapshotBatch, frame_time_ms: f64) -> usize {
        batch
            .entities
            .iter()
            .filter(|state| {
                self.push_snapshot(state.entity_id, Snapshot::from(*state), frame_time_ms)
            })
            .count()
    }

    fn observe_server_time(&mut self, server_time_ms: u64, frame_time_ms: f64) {
        if server_time_ms <= self.newest_server_time_ms {
            return;
        }
        self.newest_server_time_ms = server_time_ms;

        let sample_offset = server_time_ms as f64 - frame_time_ms;
        match self.server_time_offset_ms.as_mut() {
            None => self.server_time_offset_ms = Some(sample_offset),
            Some(offset) => {
                *offset += (sample_offset - *offset) * self.config.time_correction_rate;
            }
        }
    }

    /// Render state of `entity` for the frame at `frame_time_ms`, or `None`
    /// while no sample has been received for it.
    pub fn render(&self, entity: EntityId, frame_time_ms: f64) -> Option<RenderState> {
        self.sample(entity, frame_time_ms).map(|sample| sample.state)
    }

    pub fn sample(&self, entity: EntityId, frame_time_ms: f64) -> Option<RenderSample> {
        let track = self.tracks.get(&entity)?;
        let latest = track.pair.latest()?;

        let (position, angle, mode) = match track.pair.previous() {
            Some(previous) => {
                // Server time past `latest`, measured from its arrival.
                let elapsed = frame_time_ms - track.arrived_at_ms;

                if elapsed <= 0.0 {
                    let window = (latest.timestamp_ms - previous.timestamp_ms) as f64;
                    let since_previous = window + elapsed;
                    let t = (since_previous / self.config.tick_interval_ms).clamp(0.0, 1.0) as f32;
                    (
                        previous.position.lerp(latest.position, t),
                        lerp_angle(previous.angle, latest.angle, t),
                        RenderMode::Interpolated,
                    )
                } else {
                    (
                        latest.position + latest.velocity * elapsed as f32,
                        latest.angle,
                        RenderMode::Extrapolated,
                    )
                }
            }
            None => (latest.position, latest.angle, RenderMode::Snapped),
        };

        Some(RenderSample {
            state: RenderState::new(clamp_to_interior(position, self.config.entity_radius), angle),
            mode,
        })
    }

    pub fn render_all(
        &self,
        frame_time_ms: f64,
    ) -> impl Iterator<Item = (EntityId, RenderState)> + '_ {
        self.tracks
            .keys()
            .filter_map(move |&id| self.render(id, frame_time_ms).map(|state| (id, state)))
    }

    /// Frame time at which the newest sample of `entity` arrived.
    pub fn last_arrival_ms(&self, entity: EntityId) -> Option<f64> {
        self.tracks.get(&entity).map(|track| track.arrived_at_ms)
    }

    pub fn track(&self, entity: EntityId) -> Option<&SnapshotPair> {
        self.tracks.get(&entity).map(|track| &track.pair)
    }

    pub fn tracked(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.tracks.keys().copied()
    }

    pub fn is_tracking(&self, entity: EntityId) -> bool {
        self.tracks.contains_key(&entity)
    }

    pub fn remove_entity(&mut self, entity: EntityId) -> bool {
        self.tracks.remove(&entity).is_some()
    }

    /// Smoothed server clock minus frame clock over every accepted sample.
    pub fn server_time_offset_ms(&self) -> Option<f64> {
        self.server_time_offset_ms
    }

    pub fn reset(&mut self) {
        self.tracks.clear();
        self.server_time_offset_ms = None;
        self.newest_server_time_ms = 0;
        self.accepted = 0;
        self.discarded = 0;
    }

    pub fn stats(&self, frame_time_ms: f64) -> InterpolationStats {
        let extrapolating = self
            .tracks
            .keys()
            .filter_map(|&id| self.sample(id, frame_time_ms))
            .filter(|sample| sample.mode == RenderMode::Extrapolated)
            .count();

        InterpolationStats {
            tracked_entities: self.tracks.len(),
            accepted: self.accepted,
            discarded: self.discarded,
            extrapolating,
            server_time_offset_ms: self.server_time_offset_ms.unwrap_or_default(),
        }
    }
}

fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Interpolates between two headings along the shorter arc.
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    let delta = wrap_angle(to - from);
    wrap_angle(from + delta * t)
}

#[derive(Debug, Clone, Default)]
pub struct InterpolationStats {
    pub tracked_entities: usize,
    pub accepted: u64,
    pub discarded: u64,
    pub extrapolating: usize,
    pub server_time_offset_ms: f64,
}
