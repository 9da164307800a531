//! Benchmark profiles and utilities for the Lumen snapshot client.
//!
//! Provides deterministic synthetic snapshots sized like real traffic:
//!
//! - [`reference_snapshot`]: a mid-sized city block (64 agents, 128 waypoints, 16 lights)
//! - [`stress_snapshot`]: 10x the reference load
//! - [`synthetic_snapshot`]: arbitrary sizes from a seed

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use lumen_core::{Snapshot, TickId, Vec2};
use lumen_wire::encode_snapshot;

/// Extent of the square world the synthetic points are drawn from.
pub const WORLD_EXTENT: f32 = 1_000.0;

/// Sizes of a synthetic snapshot.
#[derive(Clone, Copy, Debug)]
pub struct SnapshotShape {
    pub agents: usize,
    pub waypoints: usize,
    pub lights: usize,
}

/// Build a snapshot with the given shape. Every agent gets a goal.
pub fn synthetic_snapshot(shape: SnapshotShape, tick: i64, seed: u64) -> Snapshot {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut points = |n: usize| -> Vec<Vec2> {
        (0..n)
            .map(|_| {
                Vec2::new(
                    rng.gen_range(0.0..WORLD_EXTENT),
                    rng.gen_range(0.0..WORLD_EXTENT),
                )
            })
            .collect()
    };
    let agents = points(shape.agents);
    let waypoints = points(shape.waypoints);
    let goals = points(shape.agents);
    let light_positions = points(shape.lights);
    let light_states = (0..shape.lights).map(|i| i % 2 == 0).collect();

    Snapshot {
        agents,
        waypoints,
        goals,
        light_positions,
        light_states,
        tick: TickId(tick),
        ..Snapshot::default()
    }
}

/// A mid-sized scene: 64 agents, 128 waypoints, 16 lights.
pub fn reference_snapshot(tick: i64) -> Snapshot {
    synthetic_snapshot(
        SnapshotShape {
            agents: 64,
            waypoints: 128,
            lights: 16,
        },
        tick,
        42,
    )
}

/// Ten times the reference load.
pub fn stress_snapshot(tick: i64) -> Snapshot {
    synthetic_snapshot(
        SnapshotShape {
            agents: 640,
            waypoints: 1_280,
            lights: 160,
        },
        tick,
        42,
    )
}

/// Wire text for `snapshot`, as the server would send it.
pub fn wire_text(snapshot: &Snapshot) -> String {
    encode_snapshot(snapshot).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_wire::parse_snapshot;

    #[test]
    fn synthetic_snapshot_is_deterministic() {
        let a = reference_snapshot(1);
        let b = reference_snapshot(1);
        assert_eq!(a, b);
    }

    #[test]
    fn shapes_are_respected() {
        let s = stress_snapshot(0);
        assert_eq!(s.agents.len(), 640);
        assert_eq!(s.goals.len(), 640);
        assert_eq!(s.waypoints.len(), 1_280);
        assert!(s.lights_valid());
        assert_eq!(s.light_positions.len(), 160);
    }

    #[test]
    fn wire_text_parses_back() {
        let s = reference_snapshot(9);
        assert_eq!(parse_snapshot(&wire_text(&s)).unwrap(), s);
    }
}
