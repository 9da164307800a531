//! Wire format for the Lumen snapshot protocol.
//!
//! The server and client exchange JSON objects over a single TCP stream:
//! snapshots flow from the server, receipts flow back.
//!
//! # Architecture
//!
//! - [`FrameDecoder`] cuts raw socket reads into text messages
//! - [`parse_snapshot`] turns one message into a [`Snapshot`](lumen_core::Snapshot)
//! - [`encode_receipt`] turns a [`Receipt`](lumen_core::Receipt) into
//!   the bytes of a single transport write
//!
//! # Framing
//!
//! The reference server writes one complete object per `send` and never
//! delimits messages, so the default [`FramingMode::PerRead`] treats each
//! socket read as one message. This only holds while the transport does
//! not split or coalesce writes; [`FramingMode::NewlineDelimited`] is
//! available for servers that terminate each object with `\n`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod frame;
pub mod receipt;
pub mod snapshot;

pub use error::WireError;
pub use frame::{FrameDecoder, FramingMode, DEFAULT_MAX_FRAME_LEN, DEFAULT_READ_CHUNK};
pub use receipt::{decode_receipt, encode_receipt};
pub use snapshot::{encode_snapshot, parse_snapshot};
