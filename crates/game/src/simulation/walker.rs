use glam::Vec2;

use crate::snapshot::{Snapshot, clamp_to_interior};

/// Straight-line mover that bounces off the interior bounds of the maze.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Walker {
    pub position: Vec2,
    pub heading: f32,
    pub velocity: Vec2,
}

impl Walker {
    pub fn new(position: Vec2, heading: f32) -> Self {
        Self {
            position,
            heading,
            velocity: Vec2::ZERO,
        }
    }

    /// Advances by `dt_ms` at `speed` units/ms and reflects the heading on
    /// any axis that hit the bounds.
    pub fn step(&mut self, speed: f32, dt_ms: u64, radius: f32) {
        let mut direction = Vec2::from_angle(self.heading);
        let target = self.position + direction * speed * dt_ms as f32;
        let clamped = clamp_to_interior(target, radius);

        if clamped.x != target.x {
            direction.x = -direction.x;
        }
        if clamped.y != target.y {
            direction.y = -direction.y;
        }

        self.heading = direction.to_angle();
        self.position = clamped;
        self.velocity = direction * speed;
    }

    pub fn snapshot(&self, timestamp_ms: u64) -> Snapshot {
        Snapshot::new(timestamp_ms, self.position, self.heading, self.velocity)
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use super::*;

    #[test]
    fn test_walks_along_heading() {
        let mut walker = Walker::new(Vec2::new(0.5, 0.5), 0.0);
        walker.step(0.001, 50, 0.02);

        assert!((walker.position.x - 0.55).abs() < 1e-5);
        assert!((walker.position.y - 0.5).abs() < 1e-5);
        assert!((walker.velocity.x - 0.001).abs() < 1e-7);
    }

    #[test]
    fn test_bounces_off_the_east_wall() {
        let mut walker = Walker::new(Vec2::new(0.97, 0.5), 0.0);
        walker.step(0.001, 50, 0.02);

        assert!((walker.position.x - 0.98).abs() < 1e-5);
        assert!((walker.heading.abs() - PI).abs() < 1e-4);
        assert!(walker.velocity.x < 0.0);
    }

    #[test]
    fn test_never_leaves_the_interior() {
        let radius = 0.015;
        let mut walker = Walker::new(Vec2::new(0.2, 0.8), 0.7);
        for _ in 0..2_000 {
            walker.step(0.0009, 50, radius);
            assert!(walker.position.cmpge(Vec2::splat(radius)).all());
            assert!(walker.position.cmple(Vec2::splat(1.0 - radius)).all());
        }
    }
}
