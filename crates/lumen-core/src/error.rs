//! Error types shared across the Lumen workspace.
//!
//! Only the collaborator-facing errors live here: sending a receipt and
//! capturing an artifact. Wire decoding errors belong to `lumen-wire`
//! and configuration errors to `lumen-client`.

use std::error::Error;
use std::fmt;
use std::io;

/// Errors from the outbound receipt path.
///
/// Returned by [`ReceiptSink::send_receipt`](crate::traits::ReceiptSink).
/// The protocol is at-most-once: callers log these and move on.
#[derive(Debug)]
pub enum SendError {
    /// No connection to the server is currently established.
    NotConnected,
    /// The receipt could not be serialized.
    Encode {
        /// Description of the encoding failure.
        reason: String,
    },
    /// The transport write failed.
    Io(io::Error),
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "no active connection to the server"),
            Self::Encode { reason } => write!(f, "receipt encoding failed: {reason}"),
            Self::Io(e) => write!(f, "receipt write failed: {e}"),
        }
    }
}

impl Error for SendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SendError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Errors from artifact capture.
///
/// Returned by [`Capturer::capture`](crate::traits::Capturer).
#[derive(Debug)]
pub enum CaptureError {
    /// The capture backend reported a failure.
    Failed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// Writing the artifact failed.
    Io(io::Error),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed { reason } => write!(f, "capture failed: {reason}"),
            Self::Io(e) => write!(f, "capture I/O error: {e}"),
        }
    }
}

impl Error for CaptureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CaptureError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
