//! Connection worker and foreground sync loop for the Lumen client.
//!
//! Two schedules share nothing but a queue:
//!
//! ```text
//! Ingest thread ("lumen-ingest")          Host cycle (step())
//!     |                                        |
//!     | connect(host:port) ── retry/backoff    |
//!     | read(buf) ─> FrameDecoder              |
//!     |   └─> IngestSender::enqueue ──────────>| IngestReceiver::try_dequeue
//!     |       [crossbeam unbounded]            | parse_snapshot
//!     |                                        | SceneBuilder (clear, spawn, camera)
//!     |                                        | Capturer::capture(tick)
//!     |<── write clone of the socket ──────────| ReceiptSink::send_receipt
//!     | 0-byte read / error ─> reconnect       |
//! ```
//!
//! [`RenderClient`] wires the pieces together; [`ConnectionWorker`] and
//! [`SyncLoop`] can also be used on their own.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod artifact;
pub mod client;
pub mod config;
pub mod connection;
pub mod ingest;
mod ingest_thread;
pub mod metrics;
pub mod scene;
pub mod sync;

pub use artifact::{ArtifactNamer, FrameGrabber, NamingCapturer};
pub use client::RenderClient;
pub use config::{ClientConfig, ConfigError, ReconnectConfig};
pub use connection::{
    ConnectionHandle, ConnectionState, ConnectionStats, ConnectionWorker, ShutdownReport,
};
pub use ingest::{ingest_queue, IngestReceiver, IngestSender};
pub use metrics::SyncMetrics;
pub use scene::{build_scene, SceneOptions, SceneSummary};
pub use sync::{StepOutcome, SyncLoop};
