//! Rebuilding the scene from a snapshot.

use lumen_core::{SceneBuilder, Snapshot, DEFAULT_OVERHEAD_HEIGHT};

/// Knobs for scene reconstruction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneOptions {
    /// Camera height above the waypoint centroid when the snapshot has
    /// no camera override.
    pub overhead_height: f32,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            overhead_height: DEFAULT_OVERHEAD_HEIGHT,
        }
    }
}

/// What [`build_scene`] spawned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SceneSummary {
    /// Agents spawned.
    pub agents: usize,
    /// Agents that were given a goal to face.
    pub agents_with_goal: usize,
    /// Road segments spawned.
    pub roads: usize,
    /// Lights spawned.
    pub lights: usize,
    /// Whether light positions and states disagreed in length.
    pub lights_skipped: bool,
    /// Whether the camera came from the snapshot rather than the centroid.
    pub camera_override: bool,
}

/// Spawn everything `snapshot` describes into `scene` and place the camera.
///
/// The caller is responsible for clearing the previous scene first.
/// Order: roads, agents, lights, camera.
pub fn build_scene<B>(scene: &mut B, snapshot: &Snapshot, options: &SceneOptions) -> SceneSummary
where
    B: SceneBuilder + ?Sized,
{
    let mut summary = SceneSummary::default();

    for segment in snapshot.road_segments() {
        scene.spawn_road_segment(segment.midpoint(), segment.length(), segment.facing());
        summary.roads += 1;
    }

    for (i, agent) in snapshot.agents.iter().enumerate() {
        let facing = snapshot.goal_for(i).map(|g| g.to_ground());
        if facing.is_some() {
            summary.agents_with_goal += 1;
        }
        scene.spawn_agent(agent.to_ground(), facing);
        summary.agents += 1;
    }

    match snapshot.lights() {
        Some(lights) => {
            for (position, is_red) in lights {
                scene.spawn_light(position.to_ground(), is_red);
                summary.lights += 1;
            }
        }
        None => summary.lights_skipped = true,
    }

    summary.camera_override = snapshot.camera_override().is_some();
    scene.set_camera(snapshot.camera_pose(options.overhead_height));

    summary
}
