//! Paced image upload over an open session.
//!
//! The sequence runs under the session's writer lock from the command
//! line to the last chunk, so no other send can land in between. Timing
//! follows the peer firmware: it needs a settle delay after the command
//! line and a short gap after every 64-byte write to drain its buffer.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, trace};

use crate::error::LinkError;
use crate::event::LinkEvent;
use crate::network::session::LinkSession;
use crate::protocol::ImageUpload;

/// Decides when an upload reports progress.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    sent: usize,
    total: usize,
    interval: usize,
}

impl ProgressTracker {
    pub fn new(total: usize, interval: usize) -> Self {
        Self {
            sent: 0,
            total,
            interval: interval.max(1),
        }
    }

    /// Account for `len` more bytes. Returns a progress event when the
    /// running count hits a multiple of the interval or the total.
    pub fn advance(&mut self, len: usize) -> Option<LinkEvent> {
        self.sent += len;
        if self.sent % self.interval == 0 || self.sent == self.total {
            Some(LinkEvent::UploadProgress {
                bytes_sent: self.sent,
                total_bytes: self.total,
                percent: self.percent(),
            })
        } else {
            None
        }
    }

    pub fn sent(&self) -> usize {
        self.sent
    }

    fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.sent as f64 / self.total as f64 * 100.0
        }
    }
}

impl LinkSession {
    /// Send a framed image: command line, settle delay, size header,
    /// then paced chunks. The first write error aborts the sequence; no
    /// partial retry is attempted. Cancelling the [`abort_handle`]
    /// stops it at the next delay with [`LinkError::Aborted`].
    ///
    /// [`abort_handle`]: LinkSession::abort_handle
    pub async fn upload_image(&self, upload: &ImageUpload) -> Result<(), LinkError> {
        let mut writer = self.writer.lock().await;
        if self.cancel.is_cancelled() {
            return Err(LinkError::Aborted);
        }
        let total = upload.total_bytes();

        info!(port = %self.port(), total, chunks = upload.chunk_count(), "starting image upload");
        self.emit(LinkEvent::UploadStarted { total_bytes: total }).await;

        self.write_locked(&mut writer, &upload.command).await?;
        self.pause(self.pacing.settle_delay()).await?;

        self.write_locked(&mut writer, &upload.size_header).await?;

        let mut progress = ProgressTracker::new(total, self.pacing.progress_interval);
        for (index, chunk) in upload.chunks.iter().enumerate() {
            self.write_locked(&mut writer, chunk).await?;
            if let Some(event) = progress.advance(chunk.len()) {
                self.emit(event).await;
            }
            trace!(index, sent = progress.sent(), "chunk written");
            self.pause(self.pacing.pacing_delay()).await?;
        }

        info!(total, "image upload complete");
        self.emit(LinkEvent::UploadComplete { total_bytes: total }).await;
        Ok(())
    }

    async fn pause(&self, delay: Duration) -> Result<(), LinkError> {
        tokio::select! {
            _ = self.cancel.cancelled() => {
                info!(port = %self.port(), "image upload aborted");
                Err(LinkError::Aborted)
            }
            _ = sleep(delay) => Ok(()),
        }
    }
}
