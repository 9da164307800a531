//! Test utilities and mock types for Lumen development.
//!
//! Provides recording and failing implementations of the collaborator
//! traits ([`SceneBuilder`], [`Capturer`], [`ReceiptSink`]), a loopback
//! [`FakePeer`] standing in for the simulation server, and message
//! [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
mod peer;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use lumen_core::{
    CameraPose, CaptureError, Capturer, Receipt, ReceiptSink, SceneBuilder, SceneKind, SendError,
    TickId, Vec3,
};

pub use peer::{FakePeer, PeerConnection};

// ── Scene ────────────────────────────────────────────────────────

/// One call made on a [`RecordingScene`].
#[derive(Clone, Debug, PartialEq)]
pub enum SceneCommand {
    Clear(Vec<SceneKind>),
    SpawnAgent {
        position: Vec3,
        facing: Option<Vec3>,
    },
    SpawnRoad {
        midpoint: Vec3,
        length: f32,
        facing: Vec3,
    },
    SpawnLight {
        position: Vec3,
        is_red: bool,
    },
    SetCamera(CameraPose),
}

/// [`SceneBuilder`] that records every call.
///
/// The query helpers ([`agents`](Self::agents), [`roads`](Self::roads),
/// [`lights`](Self::lights), [`camera`](Self::camera)) only look at
/// commands issued after the most recent clear, i.e. the live scene.
#[derive(Debug, Default)]
pub struct RecordingScene {
    commands: Vec<SceneCommand>,
}

impl RecordingScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command, oldest first.
    pub fn commands(&self) -> &[SceneCommand] {
        &self.commands
    }

    /// Number of clear calls seen.
    pub fn clears(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, SceneCommand::Clear(_)))
            .count()
    }

    fn live(&self) -> &[SceneCommand] {
        let start = self
            .commands
            .iter()
            .rposition(|c| matches!(c, SceneCommand::Clear(_)))
            .map_or(0, |i| i + 1);
        &self.commands[start..]
    }

    pub fn agents(&self) -> Vec<(Vec3, Option<Vec3>)> {
        self.live()
            .iter()
            .filter_map(|c| match c {
                SceneCommand::SpawnAgent { position, facing } => Some((*position, *facing)),
                _ => None,
            })
            .collect()
    }

    pub fn roads(&self) -> Vec<(Vec3, f32, Vec3)> {
        self.live()
            .iter()
            .filter_map(|c| match c {
                SceneCommand::SpawnRoad {
                    midpoint,
                    length,
                    facing,
                } => Some((*midpoint, *length, *facing)),
                _ => None,
            })
            .collect()
    }

    pub fn lights(&self) -> Vec<(Vec3, bool)> {
        self.live()
            .iter()
            .filter_map(|c| match c {
                SceneCommand::SpawnLight { position, is_red } => Some((*position, *is_red)),
                _ => None,
            })
            .collect()
    }

    /// Last camera pose set in the live scene.
    pub fn camera(&self) -> Option<CameraPose> {
        self.live().iter().rev().find_map(|c| match c {
            SceneCommand::SetCamera(pose) => Some(*pose),
            _ => None,
        })
    }
}

impl SceneBuilder for RecordingScene {
    fn clear_tagged(&mut self, kinds: &[SceneKind]) {
        self.commands.push(SceneCommand::Clear(kinds.to_vec()));
    }

    fn spawn_agent(&mut self, position: Vec3, facing: Option<Vec3>) {
        self.commands
            .push(SceneCommand::SpawnAgent { position, facing });
    }

    fn spawn_road_segment(&mut self, midpoint: Vec3, length: f32, facing: Vec3) {
        self.commands.push(SceneCommand::SpawnRoad {
            midpoint,
            length,
            facing,
        });
    }

    fn spawn_light(&mut self, position: Vec3, is_red: bool) {
        self.commands
            .push(SceneCommand::SpawnLight { position, is_red });
    }

    fn set_camera(&mut self, pose: CameraPose) {
        self.commands.push(SceneCommand::SetCamera(pose));
    }
}

// ── Capturers ────────────────────────────────────────────────────

/// [`Capturer`] returning `<prefix><tick>.png` and recording each tick.
#[derive(Debug, Default)]
pub struct FixedCapturer {
    prefix: String,
    ticks: Vec<TickId>,
}

impl FixedCapturer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ticks: Vec::new(),
        }
    }

    /// Ticks captured so far, in order.
    pub fn ticks(&self) -> &[TickId] {
        &self.ticks
    }
}

impl Capturer for FixedCapturer {
    fn capture(&mut self, tick: TickId) -> Result<String, CaptureError> {
        self.ticks.push(tick);
        Ok(format!("{}{tick}.png", self.prefix))
    }
}

/// [`Capturer`] that always fails.
#[derive(Debug)]
pub struct FailingCapturer {
    reason: String,
    calls: usize,
}

impl FailingCapturer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            calls: 0,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl Capturer for FailingCapturer {
    fn capture(&mut self, _tick: TickId) -> Result<String, CaptureError> {
        self.calls += 1;
        Err(CaptureError::Failed {
            reason: self.reason.clone(),
        })
    }
}

// ── Sinks ────────────────────────────────────────────────────────

/// [`ReceiptSink`] that stores every receipt.
#[derive(Debug, Default)]
pub struct RecordingSink {
    receipts: Mutex<Vec<Receipt>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn receipts(&self) -> Vec<Receipt> {
        self.receipts.lock().unwrap().clone()
    }
}

impl ReceiptSink for RecordingSink {
    fn send_receipt(&self, receipt: &Receipt) -> Result<(), SendError> {
        self.receipts.lock().unwrap().push(receipt.clone());
        Ok(())
    }
}

/// [`ReceiptSink`] that fails every send with an error built by `make_error`.
pub struct FailingSink {
    make_error: Box<dyn Fn() -> SendError + Send + Sync>,
    attempts: AtomicUsize,
}

impl FailingSink {
    pub fn new(make_error: impl Fn() -> SendError + Send + Sync + 'static) -> Self {
        Self {
            make_error: Box::new(make_error),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }
}

impl ReceiptSink for FailingSink {
    fn send_receipt(&self, _receipt: &Receipt) -> Result<(), SendError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        Err((self.make_error)())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_view_starts_after_last_clear() {
        let mut scene = RecordingScene::new();
        scene.spawn_agent(Vec3::new(1.0, 0.0, 1.0), None);
        scene.clear_tagged(&SceneKind::ALL);
        scene.spawn_agent(Vec3::new(2.0, 0.0, 2.0), None);

        assert_eq!(scene.agents(), vec![(Vec3::new(2.0, 0.0, 2.0), None)]);
        assert_eq!(scene.clears(), 1);
        assert_eq!(scene.commands().len(), 3);
    }

    #[test]
    fn failing_sink_counts_attempts() {
        let sink = FailingSink::new(|| SendError::NotConnected);
        assert!(sink.send_receipt(&Receipt::new("a")).is_err());
        assert_eq!(sink.attempts(), 1);
    }
}
