//! Ingest loop: connect, read, enqueue, reconnect.
//!
//! The ingest thread owns the read half of the socket and the frame
//! decoder exclusively. It touches shared state only through atomics and
//! the writer slot in [`Shared`].

use std::fmt;
use std::io::{self, Read};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use lumen_wire::FrameDecoder;

use crate::config::{ClientConfig, ReconnectConfig};
use crate::connection::{ConnectionState, Shared, StatsCounters};
use crate::ingest::IngestSender;

// ── ReconnectBackoff ─────────────────────────────────────────────

/// Exponential delay between failed connection attempts.
pub(crate) struct ReconnectBackoff {
    config: ReconnectConfig,
    next_delay_ms: u64,
}

impl ReconnectBackoff {
    pub fn new(config: &ReconnectConfig) -> Self {
        Self {
            config: config.clone(),
            next_delay_ms: config.initial_delay_ms,
        }
    }

    /// Delay to wait now; advances the schedule for the next failure.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next_delay_ms;
        let grown = (delay as f64 * self.config.backoff_factor) as u64;
        self.next_delay_ms = grown.max(delay).min(self.config.max_delay_ms);
        Duration::from_millis(delay)
    }

    /// Back to the initial delay after a successful connection.
    pub fn reset(&mut self) {
        self.next_delay_ms = self.config.initial_delay_ms;
    }
}

// ── Disconnect ───────────────────────────────────────────────────

/// Why a session ended.
#[derive(Debug)]
pub(crate) enum Disconnect {
    /// The peer closed the stream (zero-byte read).
    StreamClosed,
    /// A read failed with something other than a poll timeout.
    ConnectionFailure(io::Error),
    /// Nothing arrived within the configured idle timeout.
    IdleTimeout(Duration),
    /// The worker was asked to stop.
    Shutdown,
}

impl fmt::Display for Disconnect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StreamClosed => write!(f, "server closed the stream"),
            Self::ConnectionFailure(e) => write!(f, "connection failure: {e}"),
            Self::IdleTimeout(limit) => write!(f, "no data for {limit:?}"),
            Self::Shutdown => write!(f, "shutdown requested"),
        }
    }
}

/// Whether a finished session was healthy enough to reset the backoff.
///
/// A session counts once it delivered data or stayed open for at least
/// the longest retry delay. Anything shorter (a server that accepts and
/// hangs up straight away) is treated like a failed connect.
pub(crate) fn is_stable_session(
    bytes_read: u64,
    uptime: Duration,
    config: &ReconnectConfig,
) -> bool {
    bytes_read > 0 || uptime >= Duration::from_millis(config.max_delay_ms)
}

// ── Reader pump ──────────────────────────────────────────────────

/// Read from `reader` until the session ends, enqueueing every decoded
/// message in arrival order.
///
/// Read timeouts (`WouldBlock`/`TimedOut`) are poll points: the loop
/// rechecks the shutdown flag and the idle limit, then reads again.
pub(crate) fn pump_reader<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    decoder: &mut FrameDecoder,
    queue: &IngestSender,
    shared: &Shared,
    idle_timeout: Option<Duration>,
) -> Disconnect {
    let mut messages = Vec::new();
    let mut last_activity = Instant::now();

    loop {
        if shared.is_shutdown() {
            return Disconnect::Shutdown;
        }
        match reader.read(buf) {
            Ok(0) => {
                return if shared.is_shutdown() {
                    Disconnect::Shutdown
                } else {
                    Disconnect::StreamClosed
                };
            }
            Ok(n) => {
                last_activity = Instant::now();
                StatsCounters::bump(&shared.stats.bytes_read, n as u64);
                let result = decoder.decode_into(&buf[..n], &mut messages);
                for message in messages.drain(..) {
                    debug!("received {} byte message", message.len());
                    if queue.enqueue(message) {
                        StatsCounters::bump(&shared.stats.messages_ingested, 1);
                    }
                }
                if let Err(e) = result {
                    warn!("discarding partial frame: {e}");
                }
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                if let Some(limit) = idle_timeout {
                    if last_activity.elapsed() >= limit {
                        return Disconnect::IdleTimeout(limit);
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                return if shared.is_shutdown() {
                    Disconnect::Shutdown
                } else {
                    Disconnect::ConnectionFailure(e)
                };
            }
        }
    }
}

// ── IngestThreadState ────────────────────────────────────────────

/// Everything the ingest thread owns, moved in at spawn.
pub(crate) struct IngestThreadState {
    config: ClientConfig,
    shared: Arc<Shared>,
    queue: IngestSender,
    decoder: FrameDecoder,
    backoff: ReconnectBackoff,
    buf: Vec<u8>,
}

impl IngestThreadState {
    pub fn new(config: ClientConfig, shared: Arc<Shared>, queue: IngestSender) -> Self {
        let decoder = FrameDecoder::new(config.framing).with_max_frame_len(config.max_frame_len);
        let backoff = ReconnectBackoff::new(&config.reconnect);
        let buf = vec![0u8; config.read_buffer_size];
        Self {
            config,
            shared,
            queue,
            decoder,
            backoff,
            buf,
        }
    }

    /// Thread body. Returns once shutdown has been requested.
    pub fn run(mut self) {
        let endpoint = self.config.endpoint();
        info!("ingest thread started for {endpoint}");

        while !self.shared.is_shutdown() {
            self.shared.set_state(ConnectionState::Connecting);
            let stream = match self.connect() {
                Ok(stream) => stream,
                Err(_) if self.shared.is_shutdown() => break,
                Err(e) => {
                    StatsCounters::bump(&self.shared.stats.connect_failures, 1);
                    let delay = self.backoff.next_delay();
                    warn!("connect to {endpoint} failed: {e}; retrying in {delay:?}");
                    self.sleep_interruptible(delay);
                    continue;
                }
            };

            let bytes_before = self.shared.stats.bytes_read.load(Ordering::Relaxed);
            let started = Instant::now();
            let reason = match self.serve(stream) {
                Ok(Disconnect::Shutdown) => break,
                Ok(reason) => reason.to_string(),
                Err(e) => format!("session setup failed: {e}"),
            };
            let bytes = self.shared.stats.bytes_read.load(Ordering::Relaxed) - bytes_before;

            if is_stable_session(bytes, started.elapsed(), &self.config.reconnect) {
                self.backoff.reset();
                info!("disconnected from {endpoint}: {reason}");
            } else {
                let delay = self.backoff.next_delay();
                warn!("disconnected from {endpoint}: {reason}; retrying in {delay:?}");
                self.sleep_interruptible(delay);
            }
        }

        self.shared.clear_writer();
        self.shared.set_state(ConnectionState::Disconnected);
        self.shared.mark_stopped();
        info!("ingest thread stopped");
    }

    /// Try every resolved address in turn.
    ///
    /// Shutdown is checked between addresses; a single attempt runs to
    /// completion, so stopping waits at most one connect timeout.
    fn connect(&self) -> io::Result<TcpStream> {
        let addrs: Vec<SocketAddr> = (self.config.host.as_str(), self.config.port)
            .to_socket_addrs()?
            .collect();
        let mut last_err = io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses");
        for addr in addrs {
            if self.shared.is_shutdown() {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "shutdown requested"));
            }
            match TcpStream::connect_timeout(&addr, self.config.connect_timeout()) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }

    /// Run one session to completion.
    fn serve(&mut self, mut stream: TcpStream) -> io::Result<Disconnect> {
        stream.set_read_timeout(Some(self.config.read_poll()))?;
        stream.set_write_timeout(Some(self.config.write_timeout()))?;
        let _ = stream.set_nodelay(true);
        let writer = stream.try_clone()?;
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| self.config.endpoint());

        self.decoder.reset();
        self.shared.install_writer(writer);
        self.shared.set_state(ConnectionState::Connected);
        StatsCounters::bump(&self.shared.stats.connects, 1);
        info!("connected to {peer}");

        let reason = pump_reader(
            &mut stream,
            &mut self.buf,
            &mut self.decoder,
            &self.queue,
            &self.shared,
            self.config.idle_timeout(),
        );

        self.shared.clear_writer();
        self.shared.set_state(ConnectionState::Disconnected);
        StatsCounters::bump(&self.shared.stats.disconnects, 1);
        if self.decoder.buffered() > 0 {
            debug!(
                "dropping {} bytes of unterminated frame",
                self.decoder.buffered()
            );
            self.decoder.reset();
        }
        Ok(reason)
    }

    /// Sleep for `delay`, returning early on shutdown.
    fn sleep_interruptible(&self, delay: Duration) {
        let deadline = Instant::now() + delay;
        while !self.shared.is_shutdown() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::park_timeout(deadline - now);
        }
    }
}
