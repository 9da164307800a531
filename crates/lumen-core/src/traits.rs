//! Collaborator traits through which the protocol core touches the world.
//!
//! The sync loop never instantiates scene objects, takes screenshots or
//! writes to a socket itself. It talks to a [`SceneBuilder`], a
//! [`Capturer`] and a [`ReceiptSink`], so the whole protocol can be
//! exercised in tests with recording mocks.

use std::fmt;

use crate::error::{CaptureError, SendError};
use crate::geom::{CameraPose, Vec3};
use crate::id::TickId;
use crate::receipt::Receipt;

/// Category tag attached to every scene object the client spawns.
///
/// Used for bulk teardown before the next snapshot is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SceneKind {
    /// A vehicle / agent.
    Agent,
    /// A road segment.
    Road,
    /// A traffic light.
    Light,
}

impl SceneKind {
    /// Every kind the client spawns, in teardown order.
    pub const ALL: [SceneKind; 3] = [SceneKind::Agent, SceneKind::Road, SceneKind::Light];

    /// The tag string conventionally used by scene engines.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Agent => "vehicle",
            Self::Road => "road",
            Self::Light => "light",
        }
    }
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Instantiates and removes renderable objects.
///
/// All positions are renderer-space (ground plane at `y = 0`).
pub trait SceneBuilder {
    /// Remove every previously spawned object tagged with one of `kinds`.
    ///
    /// Must be idempotent: calling it on an empty scene is a no-op.
    fn clear_tagged(&mut self, kinds: &[SceneKind]);

    /// Spawn an agent, optionally oriented towards `facing`.
    fn spawn_agent(&mut self, position: Vec3, facing: Option<Vec3>);

    /// Spawn a road segment centred on `midpoint`, stretched to `length`
    /// and oriented towards `facing`.
    fn spawn_road_segment(&mut self, midpoint: Vec3, length: f32, facing: Vec3);

    /// Spawn a traffic light in its red or green variant.
    fn spawn_light(&mut self, position: Vec3, is_red: bool);

    /// Move the camera.
    fn set_camera(&mut self, pose: CameraPose);
}

/// Produces a visual artifact of the current scene.
pub trait Capturer {
    /// Capture the scene for `tick` and return the artifact's path.
    fn capture(&mut self, tick: TickId) -> Result<String, CaptureError>;
}

/// Outbound path for receipts.
///
/// Takes `&self` because the sink is shared with the connection's
/// background reader.
pub trait ReceiptSink {
    /// Deliver one receipt. Must fail rather than silently drop when
    /// there is nowhere to send it.
    fn send_receipt(&self, receipt: &Receipt) -> Result<(), SendError>;
}

impl<T: SceneBuilder + ?Sized> SceneBuilder for Box<T> {
    fn clear_tagged(&mut self, kinds: &[SceneKind]) {
        (**self).clear_tagged(kinds)
    }

    fn spawn_agent(&mut self, position: Vec3, facing: Option<Vec3>) {
        (**self).spawn_agent(position, facing)
    }

    fn spawn_road_segment(&mut self, midpoint: Vec3, length: f32, facing: Vec3) {
        (**self).spawn_road_segment(midpoint, length, facing)
    }

    fn spawn_light(&mut self, position: Vec3, is_red: bool) {
        (**self).spawn_light(position, is_red)
    }

    fn set_camera(&mut self, pose: CameraPose) {
        (**self).set_camera(pose)
    }
}

impl<T: Capturer + ?Sized> Capturer for Box<T> {
    fn capture(&mut self, tick: TickId) -> Result<String, CaptureError> {
        (**self).capture(tick)
    }
}

impl<T: ReceiptSink + ?Sized> ReceiptSink for std::sync::Arc<T> {
    fn send_receipt(&self, receipt: &Receipt) -> Result<(), SendError> {
        (**self).send_receipt(receipt)
    }
}
