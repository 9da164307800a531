//! Lumen headless client: sync with a running simulation server without a
//! renderer attached.
//!
//! Demonstrates:
//!   1. Reading the endpoint from `LUMEN_HOST` / `LUMEN_PORT`
//!   2. Implementing `SceneBuilder` for a scene that only logs
//!   3. Naming artifacts with `ArtifactNamer` and writing placeholder files
//!   4. Driving `RenderClient::step` from a fixed-rate host loop
//!   5. Shutting down and reading the final report
//!
//! Run with:
//!   RUST_LOG=info cargo run --example headless -- [steps] [output-dir]

use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use lumen::prelude::*;

// ─── Host loop parameters ───────────────────────────────────────

const DEFAULT_STEPS: u64 = 600;
const FRAME: Duration = Duration::from_millis(16);

// ─── Scene: counts entities and logs the camera ─────────────────

#[derive(Default)]
struct LogScene {
    agents: usize,
    roads: usize,
    lights: usize,
}

impl SceneBuilder for LogScene {
    fn clear_tagged(&mut self, _kinds: &[SceneKind]) {
        *self = Self::default();
    }

    fn spawn_agent(&mut self, _position: Vec3, _facing: Option<Vec3>) {
        self.agents += 1;
    }

    fn spawn_road_segment(&mut self, _midpoint: Vec3, _length: f32, _facing: Vec3) {
        self.roads += 1;
    }

    fn spawn_light(&mut self, _position: Vec3, _is_red: bool) {
        self.lights += 1;
    }

    fn set_camera(&mut self, pose: CameraPose) {
        log::debug!(
            "camera at {:?} looking at {:?}",
            pose.position,
            pose.look_at
        );
    }
}

// ─── Grabber: empty placeholder artifacts ───────────────────────

fn write_placeholder(path: &str) -> Result<(), CaptureError> {
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, [])?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let steps = match args.next() {
        Some(s) => s.parse::<u64>()?,
        None => DEFAULT_STEPS,
    };
    let out_dir = args.next().unwrap_or_else(|| "lumen-out".to_string());

    let config = ClientConfig::from_env()?;
    println!("Lumen headless client -> {}", config.endpoint());
    println!("  framing: {:?}, steps: {steps}, output: {out_dir}/", config.framing);

    let namer = ArtifactNamer::new(format!("{out_dir}/"));
    let capturer = NamingCapturer::new(namer, write_placeholder);
    let mut client = RenderClient::new(config, LogScene::default(), capturer)?;

    for _ in 0..steps {
        match client.step() {
            StepOutcome::Idle => {}
            StepOutcome::Processed {
                tick,
                receipt,
                delivered,
                ..
            } => {
                let scene = client.scene();
                log::info!(
                    "tick {tick}: {} agents, {} roads, {} lights -> {} (delivered: {delivered})",
                    scene.agents,
                    scene.roads,
                    scene.lights,
                    receipt.filepath
                );
            }
            StepOutcome::Dropped { error } => log::warn!("dropped message: {error}"),
            StepOutcome::CaptureFailed { tick, error } => {
                log::warn!("capture failed at tick {tick}: {error}")
            }
        }
        thread::sleep(FRAME);
    }

    let metrics = client.metrics().clone();
    let stats = client.connection_stats();
    let report = client.shutdown();

    println!("\n--- Summary ---");
    println!(
        "  cycles: {} (busy {}), processed: {}, dropped: {}",
        metrics.cycles,
        metrics.busy_cycles(),
        metrics.processed,
        metrics.dropped
    );
    println!(
        "  receipts: {} sent, {} failed",
        metrics.receipts_sent, metrics.receipt_failures
    );
    println!(
        "  connects: {}, disconnects: {}, bytes read: {}",
        stats.connects, stats.disconnects, stats.bytes_read
    );
    println!(
        "  shutdown: {}ms (thread joined: {})",
        report.total_ms, report.thread_joined
    );
    Ok(())
}
