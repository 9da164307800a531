//! Core types and traits for the Lumen snapshot client.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the data model exchanged with the simulation server (snapshots and
//! receipts), the geometry derived from a snapshot, and the traits
//! through which the protocol core drives its external collaborators.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod geom;
pub mod id;
pub mod receipt;
pub mod snapshot;
pub mod traits;

pub use error::{CaptureError, SendError};
pub use geom::{CameraPose, Vec2, Vec3};
pub use id::TickId;
pub use receipt::Receipt;
pub use snapshot::{CameraComponents, RoadSegment, Snapshot, DEFAULT_OVERHEAD_HEIGHT};
pub use traits::{Capturer, ReceiptSink, SceneBuilder, SceneKind};
