//! Domain-specific error types for the serial link.
//!
//! All fallible operations return `Result<T, LinkError>` or, inside the
//! compression engine, `Result<T, ImageError>`. Nothing here is fatal to
//! the process: every error leaves the caller able to retry.

use thiserror::Error;

/// The canonical error type for the link core.
#[derive(Debug, Error)]
pub enum LinkError {
    // ── Transport Errors ─────────────────────────────────────────
    /// The serial port could not be opened (busy, missing, permission).
    #[error("cannot open {port}: {source}")]
    TransportOpen {
        port: String,
        #[source]
        source: tokio_serial::Error,
    },

    /// A read or write on an open link failed.
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The event receiver was dropped.
    #[error("event channel closed")]
    ChannelClosed,

    // ── Payload Errors ───────────────────────────────────────────
    /// Compression or decoding of the source image failed.
    #[error("image error: {0}")]
    Image(#[from] ImageError),

    /// The payload does not fit the 2-byte size header.
    #[error("payload too large for size header: {size} bytes (max {max})")]
    SizeOverflow { size: usize, max: usize },

    // ── Protocol Misuse ──────────────────────────────────────────
    /// A send was attempted without an open session.
    #[error("not connected to device")]
    NotConnected,

    /// `send_image` was called with no compressed image available.
    #[error("no image compressed and ready to send")]
    NoAsset,

    /// A session is already open on this router.
    #[error("already connected to {0}")]
    AlreadyConnected(String),

    /// The session was told to close while an upload was in flight.
    #[error("upload aborted: link is closing")]
    Aborted,

    // ── Configuration ────────────────────────────────────────────
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl LinkError {
    /// Returns `true` for errors caused by calling an operation in the
    /// wrong session state rather than by the link or the payload.
    pub fn is_protocol_misuse(&self) -> bool {
        matches!(
            self,
            Self::NotConnected | Self::NoAsset | Self::AlreadyConnected(_)
        )
    }

    /// Returns `true` for read/write failures on an already open link.
    pub fn is_link_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

// ── ImageError ────────────────────────────────────────────────────

/// Errors produced by the compression engine.
///
/// No partial asset is ever produced alongside one of these.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The source buffer is not a supported raster format.
    #[error("undecodable image: {0}")]
    Undecodable(String),

    /// Width or height is zero.
    #[error("degenerate image dimensions: {width}x{height}")]
    DegenerateDimensions { width: u32, height: u32 },

    /// The JPEG encoder rejected the image.
    #[error("encode failed: {0}")]
    Encode(String),

    /// The budget would make the search loop forever or never encode.
    #[error("invalid compression budget: {0}")]
    InvalidBudget(&'static str),
}

impl From<std::io::Error> for ImageError {
    fn from(e: std::io::Error) -> Self {
        ImageError::Undecodable(e.to_string())
    }
}

// ── Convenient From implementations ──────────────────────────────

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for LinkError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        LinkError::ChannelClosed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = LinkError::SizeOverflow {
            size: 70_000,
            max: 65_535,
        };
        assert!(e.to_string().contains("70000"));
        assert!(e.to_string().contains("65535"));

        let e = LinkError::from(ImageError::DegenerateDimensions {
            width: 0,
            height: 12,
        });
        assert!(e.to_string().contains("0x12"));
    }

    #[test]
    fn misuse_is_distinct_from_io() {
        assert!(LinkError::NotConnected.is_protocol_misuse());
        assert!(LinkError::NoAsset.is_protocol_misuse());
        assert!(!LinkError::NoAsset.is_link_io());

        let size = LinkError::SizeOverflow { size: 1, max: 0 };
        assert!(!size.is_protocol_misuse());
        assert!(!size.is_link_io());

        assert!(!LinkError::Aborted.is_protocol_misuse());
        assert!(!LinkError::Aborted.is_link_io());
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broke");
        let e: LinkError = io_err.into();
        assert!(e.is_link_io());
    }
}
