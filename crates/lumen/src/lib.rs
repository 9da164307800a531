//! Lumen: a renderer-side client for streaming simulation snapshots.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Lumen sub-crates. For most users, adding `lumen` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use lumen::prelude::*;
//!
//! // A scene that just logs what it is told.
//! struct PrintScene;
//! impl SceneBuilder for PrintScene {
//!     fn clear_tagged(&mut self, kinds: &[SceneKind]) { println!("clear {kinds:?}"); }
//!     fn spawn_agent(&mut self, p: Vec3, _facing: Option<Vec3>) { println!("agent at {p:?}"); }
//!     fn spawn_road_segment(&mut self, m: Vec3, len: f32, _f: Vec3) { println!("road {m:?} x{len}"); }
//!     fn spawn_light(&mut self, p: Vec3, red: bool) { println!("light {p:?} red={red}"); }
//!     fn set_camera(&mut self, pose: CameraPose) { println!("camera {pose:?}"); }
//! }
//!
//! let capturer = NamingCapturer::new(
//!     ArtifactNamer::new("/tmp/lumen/"),
//!     |_path: &str| -> Result<(), CaptureError> { Ok(()) },
//! );
//! let mut client = RenderClient::new(ClientConfig::default(), PrintScene, capturer).unwrap();
//! loop {
//!     if let StepOutcome::Processed { tick, receipt, .. } = client.step() {
//!         println!("tick {tick} -> {}", receipt.filepath);
//!     }
//!     std::thread::sleep(std::time::Duration::from_millis(16));
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `lumen-core` | Snapshot, Receipt, geometry, collaborator traits |
//! | [`wire`] | `lumen-wire` | Framing, snapshot parser, receipt codec |
//! | [`client`] | `lumen-client` | Connection worker, sync loop, configuration |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and collaborator traits (`lumen-core`).
///
/// Contains [`types::Snapshot`], [`types::Receipt`] and the traits the
/// client drives: [`types::SceneBuilder`], [`types::Capturer`] and
/// [`types::ReceiptSink`].
pub use lumen_core as types;

/// Framing and JSON codec (`lumen-wire`).
pub use lumen_wire as wire;

/// Connection worker, sync loop and configuration (`lumen-client`).
///
/// [`client::RenderClient`] ties everything together;
/// [`client::ConnectionWorker`] and [`client::SyncLoop`] can be used on
/// their own.
pub use lumen_client as client;

/// Common imports for typical Lumen usage.
///
/// ```rust
/// use lumen::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use lumen_core::{
        CameraPose, Capturer, Receipt, ReceiptSink, SceneBuilder, SceneKind, Snapshot, TickId,
        Vec2, Vec3,
    };

    // Errors
    pub use lumen_core::{CaptureError, SendError};
    pub use lumen_wire::WireError;

    // Wire
    pub use lumen_wire::FramingMode;

    // Client
    pub use lumen_client::{
        ArtifactNamer, ClientConfig, ConfigError, ConnectionState, NamingCapturer, RenderClient,
        StepOutcome, SyncMetrics,
    };
}
