//! Loopback stand-in for the simulation server.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use lumen_core::{Receipt, Snapshot};
use lumen_wire::{decode_receipt, encode_snapshot, FrameDecoder, FramingMode};

/// A listening socket on `127.0.0.1` that accepts client connections.
pub struct FakePeer {
    listener: TcpListener,
    framing: FramingMode,
}

impl FakePeer {
    /// Bind to an ephemeral loopback port.
    pub fn bind() -> io::Result<Self> {
        Self::bind_port(0)
    }

    /// Bind to a specific loopback port.
    pub fn bind_port(port: u16) -> io::Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port))?;
        listener.set_nonblocking(true)?;
        Ok(Self {
            listener,
            framing: FramingMode::PerRead,
        })
    }

    /// Frame outgoing snapshots and incoming receipts with `framing`.
    pub fn with_framing(mut self, framing: FramingMode) -> Self {
        self.framing = framing;
        self
    }

    pub fn port(&self) -> u16 {
        self.listener
            .local_addr()
            .map(|a| a.port())
            .unwrap_or_default()
    }

    /// Wait up to `timeout` for the client to connect.
    pub fn accept(&self, timeout: Duration) -> io::Result<PeerConnection> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.listener.accept() {
                Ok((stream, _)) => {
                    stream.set_nonblocking(false)?;
                    return Ok(PeerConnection {
                        stream,
                        decoder: FrameDecoder::new(self.framing),
                        framing: self.framing,
                        inbox: VecDeque::new(),
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if Instant::now() > deadline {
                        return Err(io::Error::new(
                            io::ErrorKind::TimedOut,
                            "client did not connect",
                        ));
                    }
                    thread::sleep(Duration::from_millis(5));
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// The server side of one accepted connection.
pub struct PeerConnection {
    stream: TcpStream,
    decoder: FrameDecoder,
    framing: FramingMode,
    inbox: VecDeque<String>,
}

impl PeerConnection {
    /// Send `text` as one message in a single write.
    pub fn send_text(&mut self, text: &str) -> io::Result<()> {
        let mut bytes = text.as_bytes().to_vec();
        if self.framing == FramingMode::NewlineDelimited {
            bytes.push(b'\n');
        }
        self.stream.write_all(&bytes)?;
        self.stream.flush()
    }

    /// Send raw bytes with no framing applied.
    pub fn send_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes)?;
        self.stream.flush()
    }

    pub fn send_snapshot(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        let text = encode_snapshot(snapshot)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        self.send_text(&text)
    }

    /// Wait up to `timeout` for the next receipt.
    pub fn read_receipt(&mut self, timeout: Duration) -> io::Result<Receipt> {
        let deadline = Instant::now() + timeout;
        let mut buf = [0u8; 4096];
        while self.inbox.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "no receipt"));
            }
            self.stream.set_read_timeout(Some(remaining))?;
            let n = self.stream.read(&mut buf)?;
            if n == 0 {
                return Err(io::ErrorKind::UnexpectedEof.into());
            }
            let messages = self
                .decoder
                .decode(&buf[..n])
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
            self.inbox.extend(messages);
        }
        let text = self.inbox.pop_front().unwrap_or_default();
        decode_receipt(&text).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Close the connection; the client sees a zero-length read.
    pub fn close(self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}
