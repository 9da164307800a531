//! Snapshot messages used across the test suites.

use lumen_core::{Snapshot, TickId, Vec2};

/// The reference scenario: one agent with a goal, one road, no lights,
/// no camera override, tick 7.
pub const SCENARIO: &str = r#"{"agents":[{"x":1,"y":2}],"waypoints":[{"x":0,"y":0},{"x":10,"y":0}],"goals":[{"x":5,"y":5}],"lightPositions":[],"lightStates":[],"cameraPosition":[],"cameraDirection":[],"tick":7}"#;

/// Minimal well-formed message with the given tick.
pub fn snapshot_text(tick: i64) -> String {
    format!(r#"{{"agents":[{{"x":0,"y":0}}],"waypoints":[{{"x":0,"y":0}},{{"x":1,"y":0}}],"tick":{tick}}}"#)
}

/// A small intersection: four agents, a square loop of road, two lights.
pub fn intersection(tick: i64) -> Snapshot {
    Snapshot {
        agents: vec![
            Vec2::new(0.0, 5.0),
            Vec2::new(5.0, 10.0),
            Vec2::new(10.0, 5.0),
            Vec2::new(5.0, 0.0),
        ],
        waypoints: vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
            Vec2::new(0.0, 0.0),
        ],
        goals: vec![Vec2::new(10.0, 5.0), Vec2::new(5.0, 0.0)],
        light_positions: vec![Vec2::new(5.0, 5.0), Vec2::new(6.0, 5.0)],
        light_states: vec![true, false],
        tick: TickId(tick),
        ..Snapshot::default()
    }
}
