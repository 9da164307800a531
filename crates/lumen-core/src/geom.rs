//! Plain geometry types used by snapshots and the scene interface.
//!
//! The simulation works in a 2D plane. The renderer works in 3D with
//! `y` pointing up, so a simulation point `(x, y)` lands on the ground
//! plane at `(x, 0, y)` (see [`Vec2::to_ground`]).

use std::fmt;

/// A 2D simulation coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical (depth, once projected) coordinate.
    pub y: f32,
}

impl Vec2 {
    /// Construct a point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Project onto the renderer's ground plane: `(x, 0, y)`.
    pub fn to_ground(self) -> Vec3 {
        Vec3::new(self.x, 0.0, self.y)
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Point halfway between `self` and `other`.
    pub fn midpoint(self, other: Vec2) -> Vec2 {
        Vec2::new(
            self.x + (other.x - self.x) / 2.0,
            self.y + (other.y - self.y) / 2.0,
        )
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(f32, f32)> for Vec2 {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// A 3D renderer-space vector (`y` up).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    /// X component.
    pub x: f32,
    /// Y component (up).
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Vec3 {
    /// Construct a vector.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Build from a slice of exactly three components.
    ///
    /// Returns `None` for any other length.
    pub fn from_slice(components: &[f32]) -> Option<Self> {
        match components {
            [x, y, z] => Some(Self::new(*x, *y, *z)),
            _ => None,
        }
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Where the camera sits and the point it looks at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    /// Camera position.
    pub position: Vec3,
    /// World-space point the camera is oriented towards.
    pub look_at: Vec3,
}
