//! # esplink-core
//!
//! Text and image exchange with a microcontroller peer over a serial
//! line.
//!
//! This crate contains:
//! - **Compression**: `compress` fits a raster under the payload budget
//!   by lowering JPEG quality, then resolution
//! - **Protocol**: `text:` lines, `image:upload` framing with a 2-byte
//!   size header and 64-byte chunks
//! - **Codec**: `InboundLineCodec` for lossy line decoding via `tokio_util`
//! - **Network**: `LinkSession` with a cancellable reader task and a
//!   single-writer upload path
//! - **Router**: `ChannelRouter`, the entry point for a front-end
//! - **Error**: `LinkError` and `ImageError`, typed with `thiserror`

pub mod codec;
pub mod compress;
pub mod config;
pub mod error;
pub mod event;
pub mod network;
pub mod protocol;
pub mod router;
pub mod state;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use codec::InboundLineCodec;
pub use compress::{
    CompressedAsset, CompressionBudget, CompressionReport, PREVIEW_MAX_SIDE, RawImage, compress,
    preview,
};
pub use config::{LinkConfig, SerialConfig, SessionConfig, UploadPacing};
pub use error::{ImageError, LinkError};
pub use event::{EventReceiver, EventSender, LinkEvent};
pub use network::{LinkSession, ProgressTracker};
pub use protocol::{Frame, ImageUpload, check_chunk_size, decode_inbound_line, encode_text};
pub use router::{ChannelRouter, InboundMessage, classify_inbound};
pub use state::SessionPhase;
