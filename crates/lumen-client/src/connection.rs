//! Connection worker: owns the socket and the ingest thread.
//!
//! The worker keeps a session with the server alive for as long as it
//! runs, reconnecting after failures. Reads happen only on the ingest
//! thread. Writes (receipts) come from the host cycle through a
//! [`ConnectionHandle`], which holds a cloned write half of the current
//! socket behind a mutex.

use std::io::Write;
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use lumen_core::{Receipt, ReceiptSink, SendError};
use lumen_wire::{encode_receipt, FramingMode};

use crate::config::{ClientConfig, ConfigError};
use crate::ingest::IngestSender;
use crate::ingest_thread::IngestThreadState;

// ── ConnectionState ──────────────────────────────────────────────

/// Lifecycle of the worker's session with the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket; either between sessions or stopped.
    Disconnected,
    /// Resolving, connecting, or waiting out a retry delay.
    Connecting,
    /// A session is open and being read.
    Connected,
}

impl ConnectionState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Connecting,
            2 => Self::Connected,
            _ => Self::Disconnected,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Disconnected => 0,
            Self::Connecting => 1,
            Self::Connected => 2,
        }
    }
}

// ── ConnectionStats ──────────────────────────────────────────────

/// Cumulative counters for one worker.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Sessions established.
    pub connects: u64,
    /// Sessions that ended, for any reason.
    pub disconnects: u64,
    /// Connection attempts that failed.
    pub connect_failures: u64,
    /// Messages handed to the ingest queue.
    pub messages_ingested: u64,
    /// Bytes received across all sessions.
    pub bytes_read: u64,
}

#[derive(Default)]
pub(crate) struct StatsCounters {
    pub connects: AtomicU64,
    pub disconnects: AtomicU64,
    pub connect_failures: AtomicU64,
    pub messages_ingested: AtomicU64,
    pub bytes_read: AtomicU64,
}

impl StatsCounters {
    pub fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ConnectionStats {
        ConnectionStats {
            connects: self.connects.load(Ordering::Relaxed),
            disconnects: self.disconnects.load(Ordering::Relaxed),
            connect_failures: self.connect_failures.load(Ordering::Relaxed),
            messages_ingested: self.messages_ingested.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
        }
    }
}

// ── Shared ───────────────────────────────────────────────────────

/// State visible to both the ingest thread and the host side.
pub(crate) struct Shared {
    framing: FramingMode,
    state: AtomicU8,
    shutdown: AtomicBool,
    stopped: AtomicBool,
    writer: Mutex<Option<TcpStream>>,
    pub stats: StatsCounters,
}

impl Shared {
    pub fn new(framing: FramingMode) -> Self {
        Self {
            framing,
            state: AtomicU8::new(ConnectionState::Disconnected.as_u8()),
            shutdown: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            writer: Mutex::new(None),
            stats: StatsCounters::default(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn set_state(&self, state: ConnectionState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    pub fn mark_stopped(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    fn writer(&self) -> MutexGuard<'_, Option<TcpStream>> {
        // A panic while holding the lock leaves at worst a stale socket,
        // which the next write or disconnect replaces.
        self.writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn install_writer(&self, stream: TcpStream) {
        *self.writer() = Some(stream);
    }

    pub fn clear_writer(&self) {
        self.writer().take();
    }

    /// Unblock a pending read on the current session, if any.
    fn interrupt(&self) {
        if let Some(stream) = self.writer().as_ref() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }

    fn write_message(&self, bytes: &[u8]) -> Result<(), SendError> {
        let mut guard = self.writer();
        let stream = guard.as_mut().ok_or(SendError::NotConnected)?;
        if let Err(e) = stream.write_all(bytes).and_then(|()| stream.flush()) {
            // A partial write leaves the peer mid-message, so the session is
            // unusable. Closing the socket wakes the reader, which ends the
            // session and reconnects; until then sends report NotConnected.
            let _ = stream.shutdown(Shutdown::Both);
            guard.take();
            return Err(SendError::Io(e));
        }
        Ok(())
    }
}

// ── ConnectionHandle ─────────────────────────────────────────────

/// Cheap, cloneable view of a running worker.
///
/// Used by the sync loop to send receipts and by hosts to inspect
/// connection health. Outlives the worker safely: once the worker has
/// shut down every send reports [`SendError::NotConnected`].
#[derive(Clone)]
pub struct ConnectionHandle {
    shared: Arc<Shared>,
}

impl ConnectionHandle {
    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Whether a session is open right now.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Snapshot of the worker's counters.
    pub fn stats(&self) -> ConnectionStats {
        self.shared.stats.snapshot()
    }
}

impl ReceiptSink for ConnectionHandle {
    fn send_receipt(&self, receipt: &Receipt) -> Result<(), SendError> {
        let bytes = encode_receipt(receipt, self.shared.framing).map_err(|e| SendError::Encode {
            reason: e.to_string(),
        })?;
        self.shared.write_message(&bytes)
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("state", &self.state())
            .finish()
    }
}

// ── ShutdownReport ───────────────────────────────────────────────

/// Report from [`ConnectionWorker::shutdown`].
#[derive(Debug)]
pub struct ShutdownReport {
    /// Total time spent in the shutdown sequence.
    pub total_ms: u64,
    /// Time until the ingest thread acknowledged the stop request.
    pub drain_ms: u64,
    /// Whether the ingest thread was joined successfully.
    pub thread_joined: bool,
    /// Messages the worker handed to the queue over its lifetime.
    pub messages_ingested: u64,
}

// ── ConnectionWorker ─────────────────────────────────────────────

/// Background worker that connects, reads, and enqueues messages.
///
/// Dropping the worker shuts it down.
pub struct ConnectionWorker {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl ConnectionWorker {
    /// Validate `config` and start the ingest thread.
    ///
    /// Returns immediately; the first connection attempt happens on the
    /// new thread.
    pub fn spawn(config: ClientConfig, queue: IngestSender) -> Result<Self, ConfigError> {
        config.validate()?;

        let shared = Arc::new(Shared::new(config.framing));
        let state = IngestThreadState::new(config, Arc::clone(&shared), queue);
        let thread = thread::Builder::new()
            .name("lumen-ingest".into())
            .spawn(move || state.run())
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: e.to_string(),
            })?;

        Ok(Self {
            shared,
            thread: Some(thread),
        })
    }

    /// A handle for sending receipts and reading state.
    pub fn handle(&self) -> ConnectionHandle {
        ConnectionHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Snapshot of the worker's counters.
    pub fn stats(&self) -> ConnectionStats {
        self.shared.stats.snapshot()
    }

    /// Whether the ingest thread is still running.
    pub fn is_running(&self) -> bool {
        self.thread.is_some() && !self.shared.stopped.load(Ordering::Acquire)
    }

    /// Stop the ingest thread and close the session.
    ///
    /// Sets the shutdown flag, shuts the socket down so a blocked read
    /// returns, wakes the thread from any retry delay, then joins it.
    /// A connection attempt already in flight is not interrupted, so this
    /// can block for up to one `connect_timeout_ms`. Idempotent.
    pub fn shutdown(&mut self) -> ShutdownReport {
        let Some(handle) = self.thread.take() else {
            return ShutdownReport {
                total_ms: 0,
                drain_ms: 0,
                thread_joined: true,
                messages_ingested: self.stats().messages_ingested,
            };
        };

        let start = Instant::now();
        self.shared.request_shutdown();
        self.shared.interrupt();
        handle.thread().unpark();

        // Reads poll the flag at least every read_poll_ms; a connect in
        // progress can take up to connect_timeout_ms.
        let drain_deadline = Instant::now() + Duration::from_millis(100);
        while !self.shared.stopped.load(Ordering::Acquire) && Instant::now() < drain_deadline {
            thread::yield_now();
        }
        let drain_ms = start.elapsed().as_millis() as u64;

        let thread_joined = handle.join().is_ok();
        self.shared.clear_writer();
        self.shared.set_state(ConnectionState::Disconnected);

        ShutdownReport {
            total_ms: start.elapsed().as_millis() as u64,
            drain_ms,
            thread_joined,
            messages_ingested: self.stats().messages_ingested,
        }
    }
}

impl Drop for ConnectionWorker {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.shutdown();
        }
    }
}

impl std::fmt::Debug for ConnectionWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionWorker")
            .field("state", &self.state())
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ingest_queue;
    use std::io::Read;
    use std::net::TcpListener;

    fn unused_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    fn local_config(port: u16) -> ClientConfig {
        let mut cfg = ClientConfig::for_endpoint("127.0.0.1", port);
        cfg.connect_timeout_ms = 200;
        cfg.read_poll_ms = 20;
        cfg.reconnect.initial_delay_ms = 10;
        cfg.reconnect.max_delay_ms = 50;
        cfg
    }

    fn wait_for(what: &str, mut cond: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            if Instant::now() > deadline {
                panic!("timed out waiting for {what}");
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn state_round_trips_through_atomic() {
        for s in [
            ConnectionState::Disconnected,
            ConnectionState::Connecting,
            ConnectionState::Connected,
        ] {
            assert_eq!(ConnectionState::from_u8(s.as_u8()), s);
        }
    }

    #[test]
    fn invalid_config_is_rejected_before_spawn() {
        let (tx, _rx) = ingest_queue();
        let err = ConnectionWorker::spawn(ClientConfig::for_endpoint("", 1), tx).unwrap_err();
        assert_eq!(err, ConfigError::EmptyHost);
    }

    #[test]
    fn send_without_session_is_not_connected() {
        let shared = Arc::new(Shared::new(FramingMode::PerRead));
        let handle = ConnectionHandle { shared };
        let err = handle.send_receipt(&Receipt::new("a.png")).unwrap_err();
        assert!(matches!(err, SendError::NotConnected));
    }

    #[test]
    fn unreachable_server_counts_failures_and_shuts_down_fast() {
        let (tx, _rx) = ingest_queue();
        let mut worker = ConnectionWorker::spawn(local_config(unused_port()), tx).unwrap();

        wait_for("connect failures", || worker.stats().connect_failures >= 2);
        assert_ne!(worker.state(), ConnectionState::Connected);

        let report = worker.shutdown();
        assert!(report.thread_joined);
        assert!(report.total_ms < 2_000, "shutdown took {}ms", report.total_ms);
        assert_eq!(worker.state(), ConnectionState::Disconnected);
        assert!(!worker.is_running());

        let again = worker.shutdown();
        assert!(again.thread_joined);
        assert_eq!(again.total_ms, 0);
    }

    #[test]
    fn connects_ingests_and_writes_receipts() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = ingest_queue();
        let mut worker = ConnectionWorker::spawn(local_config(port), tx).unwrap();

        let (mut peer, _) = listener.accept().unwrap();
        let handle = worker.handle();
        wait_for("connected", || handle.is_connected());

        peer.write_all(br#"{"tick":1}"#).unwrap();
        wait_for("message", || !rx.is_empty());
        assert_eq!(rx.try_dequeue().as_deref(), Some(r#"{"tick":1}"#));

        handle.send_receipt(&Receipt::new("x1.png")).unwrap();
        let mut buf = [0u8; 64];
        let n = peer.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], br#"{"filepath":"x1.png"}"#);

        let report = worker.shutdown();
        assert!(report.thread_joined);
        assert_eq!(report.messages_ingested, 1);
        let stats = worker.stats();
        assert_eq!(stats.connects, 1);
        assert_eq!(stats.bytes_read, 10);

        assert!(matches!(
            handle.send_receipt(&Receipt::new("late.png")),
            Err(SendError::NotConnected)
        ));
    }

    #[test]
    fn drop_stops_connected_worker() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, _rx) = ingest_queue();
        let worker = ConnectionWorker::spawn(local_config(port), tx).unwrap();
        let (_peer, _) = listener.accept().unwrap();
        let handle = worker.handle();
        wait_for("connected", || handle.is_connected());

        drop(worker);
        assert_eq!(handle.state(), ConnectionState::Disconnected);
    }
}
