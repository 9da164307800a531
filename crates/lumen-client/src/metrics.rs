//! Counters kept by the sync loop.
//!
//! [`SyncMetrics`] is updated by every [`SyncLoop::step`] call and can be
//! read at any time by the host. Connection-side counters live in
//! [`ConnectionStats`](crate::ConnectionStats).
//!
//! [`SyncLoop::step`]: crate::SyncLoop::step

use lumen_core::TickId;

/// Cumulative sync-loop counters plus data about the latest step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncMetrics {
    /// Total `step()` calls.
    pub cycles: u64,
    /// Steps that found the queue empty.
    pub idle_cycles: u64,
    /// Snapshots that were parsed, rendered and captured.
    pub processed: u64,
    /// Messages dropped because they did not parse.
    pub dropped: u64,
    /// Snapshots whose capture failed (no receipt was sent).
    pub capture_failures: u64,
    /// Receipts written to the connection.
    pub receipts_sent: u64,
    /// Receipts that could not be written.
    pub receipt_failures: u64,
    /// Snapshots whose tick was lower than the previous one.
    pub tick_regressions: u64,
    /// Tick of the most recently processed snapshot.
    pub last_tick: Option<TickId>,
    /// Wall-clock time of the most recent non-idle step, in microseconds.
    pub last_step_us: u64,
}

impl SyncMetrics {
    /// Steps that dequeued a message.
    pub fn busy_cycles(&self) -> u64 {
        self.cycles - self.idle_cycles
    }
}
