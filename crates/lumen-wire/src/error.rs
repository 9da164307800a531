//! Error types for framing and message codecs.

use std::fmt;

/// Errors produced while decoding or encoding protocol messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WireError {
    /// A snapshot message is not well-formed JSON or lacks a required field.
    MalformedSnapshot {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// A receipt message could not be decoded.
    MalformedReceipt {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// A delimited frame grew past the configured limit and was discarded.
    FrameTooLarge {
        /// The configured maximum frame length in bytes.
        limit: usize,
    },
    /// A message could not be serialized.
    Encode {
        /// Human-readable description of what went wrong.
        detail: String,
    },
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedSnapshot { detail } => write!(f, "malformed snapshot: {detail}"),
            Self::MalformedReceipt { detail } => write!(f, "malformed receipt: {detail}"),
            Self::FrameTooLarge { limit } => {
                write!(f, "frame exceeds {limit} bytes without a delimiter")
            }
            Self::Encode { detail } => write!(f, "encoding failed: {detail}"),
        }
    }
}

impl std::error::Error for WireError {}
