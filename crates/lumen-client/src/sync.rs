//! Foreground sync loop: one message per host cycle.
//!
//! The host calls [`SyncLoop::step`] once per update cycle. A step never
//! blocks on the network: if nothing is queued it returns
//! [`StepOutcome::Idle`] immediately, otherwise it processes exactly one
//! message, however many are waiting.

use std::time::Instant;

use log::{debug, error, warn};

use lumen_core::{
    CaptureError, Capturer, Receipt, ReceiptSink, SceneBuilder, SceneKind, TickId,
};
use lumen_wire::{parse_snapshot, WireError};

use crate::ingest::IngestReceiver;
use crate::metrics::SyncMetrics;
use crate::scene::{build_scene, SceneOptions, SceneSummary};

/// What a single [`SyncLoop::step`] did.
#[derive(Debug)]
pub enum StepOutcome {
    /// No message was pending.
    Idle,
    /// A snapshot was rendered and captured, and a receipt was built.
    Processed {
        /// Tick of the snapshot.
        tick: TickId,
        /// The receipt that was (or failed to be) sent.
        receipt: Receipt,
        /// Whether the receipt reached the connection.
        delivered: bool,
        /// What the scene builder was asked to spawn.
        summary: SceneSummary,
    },
    /// The message did not parse and was discarded.
    Dropped {
        /// Why parsing failed.
        error: WireError,
    },
    /// The scene was built but the capture failed; no receipt was sent.
    CaptureFailed {
        /// Tick of the snapshot.
        tick: TickId,
        /// Error reported by the capturer.
        error: CaptureError,
    },
}

impl StepOutcome {
    /// Whether the step found the queue empty.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Tick of the snapshot handled in this step, if one parsed.
    pub fn tick(&self) -> Option<TickId> {
        match self {
            Self::Processed { tick, .. } | Self::CaptureFailed { tick, .. } => Some(*tick),
            Self::Idle | Self::Dropped { .. } => None,
        }
    }
}

/// Drains the ingest queue one message per cycle into the collaborators.
pub struct SyncLoop<B, C, K> {
    queue: IngestReceiver,
    scene: B,
    capturer: C,
    sink: K,
    options: SceneOptions,
    metrics: SyncMetrics,
}

impl<B, C, K> SyncLoop<B, C, K>
where
    B: SceneBuilder,
    C: Capturer,
    K: ReceiptSink,
{
    /// Wire a loop to its queue and collaborators.
    pub fn new(queue: IngestReceiver, scene: B, capturer: C, sink: K) -> Self {
        Self {
            queue,
            scene,
            capturer,
            sink,
            options: SceneOptions::default(),
            metrics: SyncMetrics::default(),
        }
    }

    /// Replace the scene reconstruction options.
    pub fn with_scene_options(mut self, options: SceneOptions) -> Self {
        self.options = options;
        self
    }

    /// Run one cycle.
    ///
    /// 1. Empty queue: return [`StepOutcome::Idle`].
    /// 2. Clear every agent, road and light from the previous snapshot.
    /// 3. Dequeue the oldest message and parse it.
    /// 4. Rebuild the scene, capture it, and send the receipt.
    ///
    /// Failures are logged and reported in the outcome; none of them stop
    /// later cycles.
    pub fn step(&mut self) -> StepOutcome {
        self.metrics.cycles += 1;
        if self.queue.is_empty() {
            self.metrics.idle_cycles += 1;
            return StepOutcome::Idle;
        }

        let start = Instant::now();
        self.scene.clear_tagged(&SceneKind::ALL);
        let Some(message) = self.queue.try_dequeue() else {
            self.metrics.idle_cycles += 1;
            return StepOutcome::Idle;
        };
        let outcome = self.process(&message);
        self.metrics.last_step_us = start.elapsed().as_micros() as u64;
        outcome
    }

    fn process(&mut self, message: &str) -> StepOutcome {
        let snapshot = match parse_snapshot(message) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                self.metrics.dropped += 1;
                error!("dropping message ({} bytes): {error}", message.len());
                return StepOutcome::Dropped { error };
            }
        };

        let tick = snapshot.tick;
        if let Some(last) = self.metrics.last_tick {
            if tick < last {
                self.metrics.tick_regressions += 1;
                warn!("tick went backwards: {last} -> {tick}");
            }
        }

        let summary = build_scene(&mut self.scene, &snapshot, &self.options);
        debug!(
            "tick {tick}: {} agents, {} roads, {} lights",
            summary.agents, summary.roads, summary.lights
        );

        let filepath = match self.capturer.capture(tick) {
            Ok(path) => path,
            Err(error) => {
                self.metrics.capture_failures += 1;
                error!("capture failed for tick {tick}: {error}");
                return StepOutcome::CaptureFailed { tick, error };
            }
        };
        self.metrics.processed += 1;
        self.metrics.last_tick = Some(tick);

        let receipt = Receipt::new(filepath);
        let delivered = match self.sink.send_receipt(&receipt) {
            Ok(()) => {
                self.metrics.receipts_sent += 1;
                true
            }
            Err(e) => {
                self.metrics.receipt_failures += 1;
                warn!("receipt for tick {tick} not sent: {e}");
                false
            }
        };

        StepOutcome::Processed {
            tick,
            receipt,
            delivered,
            summary,
        }
    }

    /// Messages waiting in the queue.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Counters accumulated so far.
    pub fn metrics(&self) -> &SyncMetrics {
        &self.metrics
    }

    /// The scene collaborator.
    pub fn scene(&self) -> &B {
        &self.scene
    }

    /// Mutable access to the scene collaborator.
    pub fn scene_mut(&mut self) -> &mut B {
        &mut self.scene
    }

    /// The capture collaborator.
    pub fn capturer(&self) -> &C {
        &self.capturer
    }

    /// The receipt sink.
    pub fn sink(&self) -> &K {
        &self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{ingest_queue, IngestSender};
    use lumen_core::{SendError, Vec3};
    use lumen_test_utils::{
        fixtures, FailingCapturer, FailingSink, FixedCapturer, RecordingScene, RecordingSink,
        SceneCommand,
    };

    type TestLoop = SyncLoop<RecordingScene, FixedCapturer, RecordingSink>;

    fn test_loop() -> (IngestSender, TestLoop) {
        let (tx, rx) = ingest_queue();
        let sync = SyncLoop::new(
            rx,
            RecordingScene::new(),
            FixedCapturer::new("/renders/"),
            RecordingSink::new(),
        );
        (tx, sync)
    }

    #[test]
    fn empty_queue_is_idle_and_touches_nothing() {
        let (_tx, mut sync) = test_loop();
        assert!(sync.step().is_idle());
        assert!(sync.scene().commands().is_empty());
        assert_eq!(sync.metrics().idle_cycles, 1);
        assert!(sync.sink().receipts().is_empty());
    }

    #[test]
    fn scenario_message_is_rendered_and_acknowledged() {
        let (tx, mut sync) = test_loop();
        tx.enqueue(fixtures::SCENARIO.to_string());

        let outcome = sync.step();
        let StepOutcome::Processed {
            tick,
            receipt,
            delivered,
            summary,
        } = outcome
        else {
            panic!("expected Processed, got {outcome:?}");
        };
        assert_eq!(tick, TickId(7));
        assert!(delivered);
        assert!(receipt.filepath.ends_with("7.png"));
        assert_eq!(summary.agents, 1);
        assert_eq!(summary.roads, 1);
        assert_eq!(summary.lights, 0);
        assert!(!summary.camera_override);

        let scene = sync.scene();
        assert_eq!(
            scene.commands()[0],
            SceneCommand::Clear(SceneKind::ALL.to_vec())
        );
        assert_eq!(
            scene.agents(),
            vec![(Vec3::new(1.0, 0.0, 2.0), Some(Vec3::new(5.0, 0.0, 5.0)))]
        );
        assert_eq!(sync.sink().receipts(), vec![receipt]);
        assert_eq!(sync.metrics().last_tick, Some(TickId(7)));
    }

    #[test]
    fn backlog_is_drained_one_per_cycle() {
        let (tx, mut sync) = test_loop();
        for tick in 1..=5 {
            tx.enqueue(fixtures::snapshot_text(tick));
        }

        for expected in 1..=5 {
            let outcome = sync.step();
            assert_eq!(outcome.tick(), Some(TickId(expected)));
            assert_eq!(sync.pending(), (5 - expected) as usize);
        }
        assert!(sync.step().is_idle());
        assert_eq!(sync.metrics().processed, 5);
        assert_eq!(sync.sink().receipts().len(), 5);
    }

    #[test]
    fn malformed_message_is_dropped_and_queue_continues() {
        let (tx, mut sync) = test_loop();
        tx.enqueue(r#"{"waypoints":[],"tick":1}"#.to_string());
        tx.enqueue(fixtures::snapshot_text(2));

        let outcome = sync.step();
        assert!(matches!(
            outcome,
            StepOutcome::Dropped {
                error: WireError::MalformedSnapshot { .. }
            }
        ));
        // The previous scene is cleared even when the message is bad.
        assert_eq!(sync.scene().commands().len(), 1);
        assert!(sync.sink().receipts().is_empty());
        assert_eq!(sync.pending(), 1);

        assert_eq!(sync.step().tick(), Some(TickId(2)));
        assert_eq!(sync.metrics().dropped, 1);
        assert_eq!(sync.metrics().processed, 1);
    }

    #[test]
    fn send_failure_does_not_stop_processing() {
        let (tx, rx) = ingest_queue();
        let mut sync = SyncLoop::new(
            rx,
            RecordingScene::new(),
            FixedCapturer::new(""),
            FailingSink::new(|| SendError::NotConnected),
        );
        tx.enqueue(fixtures::snapshot_text(1));
        tx.enqueue(fixtures::snapshot_text(2));

        for _ in 0..2 {
            assert!(matches!(
                sync.step(),
                StepOutcome::Processed {
                    delivered: false,
                    ..
                }
            ));
        }
        assert_eq!(sync.metrics().receipt_failures, 2);
        assert_eq!(sync.metrics().processed, 2);
        assert_eq!(sync.sink().attempts(), 2);
    }

    #[test]
    fn capture_failure_sends_no_receipt() {
        let (tx, rx) = ingest_queue();
        let mut sync = SyncLoop::new(
            rx,
            RecordingScene::new(),
            FailingCapturer::new("disk full"),
            RecordingSink::new(),
        );
        tx.enqueue(fixtures::snapshot_text(3));

        let outcome = sync.step();
        assert!(matches!(
            outcome,
            StepOutcome::CaptureFailed {
                tick: TickId(3),
                ..
            }
        ));
        assert!(sync.sink().receipts().is_empty());
        assert_eq!(sync.metrics().capture_failures, 1);
        assert_eq!(sync.metrics().last_tick, None);
    }

    #[test]
    fn tick_regression_is_counted_not_rejected() {
        let (tx, mut sync) = test_loop();
        tx.enqueue(fixtures::snapshot_text(10));
        tx.enqueue(fixtures::snapshot_text(4));

        sync.step();
        assert_eq!(sync.step().tick(), Some(TickId(4)));
        assert_eq!(sync.metrics().tick_regressions, 1);
        assert_eq!(sync.metrics().last_tick, Some(TickId(4)));
    }

    #[test]
    fn scene_options_reach_camera() {
        let (tx, rx) = ingest_queue();
        let mut sync = SyncLoop::new(
            rx,
            RecordingScene::new(),
            FixedCapturer::new(""),
            RecordingSink::new(),
        )
        .with_scene_options(SceneOptions {
            overhead_height: 42.0,
        });
        tx.enqueue(fixtures::SCENARIO.to_string());
        sync.step();

        let pose = sync.scene().camera().unwrap();
        assert_eq!(pose.position, Vec3::new(5.0, 42.0, 0.0));
    }
}
