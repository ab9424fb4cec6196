//! Events delivered to the presentation layer.
//!
//! Every event may be produced on a background task; receivers that own
//! a UI thread must re-dispatch onto it themselves.

use std::fmt;

use tokio::sync::mpsc;

use crate::compress::CompressionReport;

pub type EventSender = mpsc::Sender<LinkEvent>;
pub type EventReceiver = mpsc::Receiver<LinkEvent>;

/// Default capacity of the event channel.
pub const DEFAULT_EVENT_BUFFER: usize = 100;

/// Create an event channel with room for `capacity` pending events.
pub fn channel(capacity: usize) -> (EventSender, EventReceiver) {
    mpsc::channel(capacity.max(1))
}

#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// A non-empty line received from the peer.
    InboundText { peer_label: String, text: String },
    /// Local echo of a line that was written to the link.
    TextSent { text: String },
    /// A read or write failed; the session is degraded.
    LinkError { message: String },
    /// An upload is about to write its command line.
    UploadStarted { total_bytes: usize },
    UploadProgress {
        bytes_sent: usize,
        total_bytes: usize,
        percent: f64,
    },
    UploadComplete { total_bytes: usize },
    CompressionResult(CompressionReport),
    CompressionFailed { reason: String },
}

impl fmt::Display for LinkEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InboundText { peer_label, text } => write!(f, "{peer_label}: {text}"),
            Self::TextSent { text } => write!(f, "You: {text}"),
            Self::LinkError { message } => write!(f, "Link error: {message}"),
            Self::UploadStarted { total_bytes } => {
                write!(f, "Starting image upload ({total_bytes} bytes)...")
            }
            Self::UploadProgress {
                bytes_sent,
                total_bytes,
                percent,
            } => write!(
                f,
                "Uploading image: {percent:.1}% ({bytes_sent}/{total_bytes} bytes)"
            ),
            Self::UploadComplete { total_bytes } => {
                write!(f, "Image upload complete: {total_bytes} bytes sent")
            }
            Self::CompressionResult(r) => write!(
                f,
                "Original: {:.1}KB | Compressed: {:.1}KB | Ratio: {:.1}x | Quality: {}%",
                r.original_size_bytes as f64 / 1024.0,
                r.compressed_size_bytes as f64 / 1024.0,
                r.ratio,
                r.quality,
            ),
            Self::CompressionFailed { reason } => write!(f, "Image error: {reason}"),
        }
    }
}
