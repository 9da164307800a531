//! `RenderClient`: the worker and the sync loop in one value.

use lumen_core::{Capturer, SceneBuilder};

use crate::config::{ClientConfig, ConfigError};
use crate::connection::{
    ConnectionHandle, ConnectionState, ConnectionStats, ConnectionWorker, ShutdownReport,
};
use crate::ingest::ingest_queue;
use crate::metrics::SyncMetrics;
use crate::scene::SceneOptions;
use crate::sync::{StepOutcome, SyncLoop};

/// A running client.
///
/// Construction starts the ingest thread; the host then calls
/// [`step`](Self::step) once per update cycle. Dropping the client (or
/// calling [`shutdown`](Self::shutdown)) stops the thread.
///
/// ```no_run
/// use lumen_client::{ClientConfig, RenderClient};
/// # use lumen_core::*;
/// # struct Scene;
/// # impl SceneBuilder for Scene {
/// #     fn clear_tagged(&mut self, _: &[SceneKind]) {}
/// #     fn spawn_agent(&mut self, _: Vec3, _: Option<Vec3>) {}
/// #     fn spawn_road_segment(&mut self, _: Vec3, _: f32, _: Vec3) {}
/// #     fn spawn_light(&mut self, _: Vec3, _: bool) {}
/// #     fn set_camera(&mut self, _: CameraPose) {}
/// # }
/// # struct Shots;
/// # impl Capturer for Shots {
/// #     fn capture(&mut self, tick: TickId) -> Result<String, CaptureError> {
/// #         Ok(format!("{tick}.png"))
/// #     }
/// # }
/// let mut client = RenderClient::new(ClientConfig::default(), Scene, Shots)?;
/// loop {
///     client.step();
///     # break;
/// }
/// client.shutdown();
/// # Ok::<(), lumen_client::ConfigError>(())
/// ```
pub struct RenderClient<B, C> {
    sync: SyncLoop<B, C, ConnectionHandle>,
    worker: ConnectionWorker,
}

impl<B: SceneBuilder, C: Capturer> RenderClient<B, C> {
    /// Validate `config`, start the connection worker and wire the loop.
    pub fn new(config: ClientConfig, scene: B, capturer: C) -> Result<Self, ConfigError> {
        config.validate()?;
        let options = SceneOptions {
            overhead_height: config.overhead_camera_height,
        };
        let (tx, rx) = ingest_queue();
        let worker = ConnectionWorker::spawn(config, tx)?;
        let sync = SyncLoop::new(rx, scene, capturer, worker.handle()).with_scene_options(options);
        Ok(Self { sync, worker })
    }

    /// Run one host cycle. See [`SyncLoop::step`].
    pub fn step(&mut self) -> StepOutcome {
        self.sync.step()
    }

    /// Messages received but not yet processed.
    pub fn pending(&self) -> usize {
        self.sync.pending()
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.worker.state()
    }

    /// Connection counters.
    pub fn connection_stats(&self) -> ConnectionStats {
        self.worker.stats()
    }

    /// Sync-loop counters.
    pub fn metrics(&self) -> &SyncMetrics {
        self.sync.metrics()
    }

    /// The scene collaborator.
    pub fn scene(&self) -> &B {
        self.sync.scene()
    }

    /// Mutable access to the scene collaborator.
    pub fn scene_mut(&mut self) -> &mut B {
        self.sync.scene_mut()
    }

    /// The capture collaborator.
    pub fn capturer(&self) -> &C {
        self.sync.capturer()
    }

    /// Stop the connection worker. Queued messages can still be drained
    /// with [`step`](Self::step); receipts then fail with
    /// [`SendError::NotConnected`](lumen_core::SendError::NotConnected).
    pub fn shutdown(&mut self) -> ShutdownReport {
        self.worker.shutdown()
    }
}
