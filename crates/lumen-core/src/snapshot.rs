//! The simulation snapshot and the scene geometry derived from it.
//!
//! A [`Snapshot`] is built by the wire parser from a single message,
//! never mutated, and consumed once by the sync loop. Everything the
//! renderer needs beyond the raw arrays (road segments, which lights to
//! draw, where the camera goes) is computed here so that it can be
//! tested without a rendering environment.

use smallvec::SmallVec;

use crate::geom::{CameraPose, Vec2, Vec3};
use crate::id::TickId;

/// Raw camera components as sent on the wire.
///
/// Usually empty or exactly three values; any other length is carried
/// through unchanged and simply disables the explicit camera override.
pub type CameraComponents = SmallVec<[f32; 3]>;

/// Height above the ground at which the derived overhead camera sits.
pub const DEFAULT_OVERHEAD_HEIGHT: f32 = 300.0;

/// One simulation instant.
///
/// Sequence order is significant everywhere: `agents[i]` pairs with
/// `goals[i]`, consecutive `waypoints` form road segments, and
/// `light_positions[i]` pairs with `light_states[i]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    /// Agent positions; the index is the agent index.
    pub agents: Vec<Vec2>,
    /// Polyline vertices connected into road segments.
    pub waypoints: Vec<Vec2>,
    /// Per-agent goals. May be shorter than `agents`.
    pub goals: Vec<Vec2>,
    /// Traffic light positions.
    pub light_positions: Vec<Vec2>,
    /// Traffic light states, parallel to `light_positions`. `true` = red.
    pub light_states: Vec<bool>,
    /// Explicit camera position; used only when it has three components.
    pub camera_position: CameraComponents,
    /// Point the explicit camera looks at.
    pub camera_direction: CameraComponents,
    /// Simulation step this snapshot describes.
    pub tick: TickId,
}

/// A road piece between two consecutive waypoints.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoadSegment {
    /// Waypoint the segment starts at.
    pub start: Vec2,
    /// Next waypoint, which the segment faces.
    pub end: Vec2,
}

impl RoadSegment {
    /// Ground-plane position of the segment centre.
    pub fn midpoint(&self) -> Vec3 {
        self.start.midpoint(self.end).to_ground()
    }

    /// Segment length in simulation units.
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    /// Ground-plane point the segment is oriented towards.
    pub fn facing(&self) -> Vec3 {
        self.end.to_ground()
    }
}

impl Snapshot {
    /// Goal of agent `index`, if the goal list is long enough.
    pub fn goal_for(&self, index: usize) -> Option<Vec2> {
        self.goals.get(index).copied()
    }

    /// One segment per consecutive waypoint pair, in waypoint order.
    pub fn road_segments(&self) -> impl Iterator<Item = RoadSegment> + '_ {
        self.waypoints.windows(2).map(|pair| RoadSegment {
            start: pair[0],
            end: pair[1],
        })
    }

    /// Whether the light arrays are parallel and can be rendered.
    pub fn lights_valid(&self) -> bool {
        self.light_positions.len() == self.light_states.len()
    }

    /// `(position, is_red)` pairs, or `None` when the arrays disagree in
    /// length. A mismatch is not an error: no lights are drawn.
    pub fn lights(&self) -> Option<impl Iterator<Item = (Vec2, bool)> + '_> {
        if !self.lights_valid() {
            return None;
        }
        Some(
            self.light_positions
                .iter()
                .copied()
                .zip(self.light_states.iter().copied()),
        )
    }

    /// The explicit camera pose, if `camera_position` has three components.
    ///
    /// When the direction does not have three components the camera looks
    /// straight down from its position.
    pub fn camera_override(&self) -> Option<CameraPose> {
        let position = Vec3::from_slice(&self.camera_position)?;
        let look_at = Vec3::from_slice(&self.camera_direction)
            .unwrap_or(Vec3::new(position.x, 0.0, position.z));
        Some(CameraPose { position, look_at })
    }

    /// Mean of all waypoints. The origin when there are none.
    pub fn waypoint_centroid(&self) -> Vec2 {
        if self.waypoints.is_empty() {
            return Vec2::default();
        }
        let n = self.waypoints.len() as f32;
        let (sx, sy) = self
            .waypoints
            .iter()
            .fold((0.0f32, 0.0f32), |(sx, sy), p| (sx + p.x, sy + p.y));
        Vec2::new(sx / n, sy / n)
    }

    /// The camera pose to render this snapshot with.
    ///
    /// Uses [`camera_override`](Self::camera_override) when available,
    /// otherwise places the camera `overhead_height` above the waypoint
    /// centroid looking straight down at it.
    pub fn camera_pose(&self, overhead_height: f32) -> CameraPose {
        if let Some(pose) = self.camera_override() {
            return pose;
        }
        let centre = self.waypoint_centroid();
        CameraPose {
            position: Vec3::new(centre.x, overhead_height, centre.y),
            look_at: Vec3::new(centre.x, 0.0, centre.y),
        }
    }
}
