//! Hand-off queue between the ingest thread and the host cycle.
//!
//! A single producer ([`IngestSender`], owned by the connection worker)
//! and a single consumer ([`IngestReceiver`], owned by the sync loop).
//! The queue is unbounded: every message the worker decodes is kept until
//! the host cycle gets to it, and dequeue order equals enqueue order.

use crossbeam_channel::{Receiver, Sender};

/// Create a connected sender/receiver pair.
pub fn ingest_queue() -> (IngestSender, IngestReceiver) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (IngestSender { tx }, IngestReceiver { rx })
}

/// Producer half of the ingest queue.
#[derive(Debug)]
pub struct IngestSender {
    tx: Sender<String>,
}

impl IngestSender {
    /// Append a message. Never blocks.
    ///
    /// Returns `false` if the receiver has been dropped; the message is
    /// discarded in that case.
    pub fn enqueue(&self, message: String) -> bool {
        self.tx.send(message).is_ok()
    }

    /// Number of messages waiting to be dequeued.
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}

/// Consumer half of the ingest queue.
#[derive(Debug)]
pub struct IngestReceiver {
    rx: Receiver<String>,
}

impl IngestReceiver {
    /// Take the oldest message, or `None` if the queue is empty. Never blocks.
    pub fn try_dequeue(&self) -> Option<String> {
        self.rx.try_recv().ok()
    }

    /// Number of messages waiting to be dequeued.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
