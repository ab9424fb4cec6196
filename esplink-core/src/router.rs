//! Channel router — the one entry point the presentation layer uses.
//!
//! Owns the optional session, dispatches outbound text and image sends
//! to it, and runs compression off the async runtime. Inbound lines are
//! classified here and forwarded unchanged on the event channel.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::{info, trace, warn};

use crate::compress::{self, CompressedAsset, CompressionBudget, CompressionReport, RawImage};
use crate::config::LinkConfig;
use crate::error::{ImageError, LinkError};
use crate::event::{self, EventReceiver, EventSender, LinkEvent};
use crate::network::LinkSession;
use crate::protocol::{ImageUpload, encode_text};
use crate::state::SessionPhase;

/// Kinds of inbound line the peer can send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    Text(String),
}

/// Classify a decoded, non-empty inbound line.
pub fn classify_inbound(line: String) -> InboundMessage {
    InboundMessage::Text(line)
}

pub struct ChannelRouter {
    config: LinkConfig,
    budget: CompressionBudget,
    events: EventSender,
    session: Option<LinkSession>,
}

impl ChannelRouter {
    /// Create a router and the event stream it reports on.
    pub fn new(config: LinkConfig, budget: CompressionBudget) -> (Self, EventReceiver) {
        let (events, rx) = event::channel(config.session.event_buffer);
        let router = Self {
            config,
            budget,
            events,
            session: None,
        };
        (router, rx)
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Open the configured serial port.
    pub fn connect(&mut self) -> Result<(), LinkError> {
        self.ensure_disconnected()?;
        let session = LinkSession::open(&self.config, self.events.clone())?;
        self.session = Some(session);
        Ok(())
    }

    /// Attach a session over an arbitrary duplex stream instead of a
    /// serial port.
    pub fn attach<S>(&mut self, label: impl Into<String>, stream: S) -> Result<(), LinkError>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        self.ensure_disconnected()?;
        let session =
            LinkSession::from_stream(label.into(), stream, &self.config, self.events.clone());
        self.session = Some(session);
        Ok(())
    }

    /// Attach a session over separate read and write halves.
    pub fn attach_parts<R, W>(
        &mut self,
        label: impl Into<String>,
        reader: R,
        writer: W,
    ) -> Result<(), LinkError>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        self.ensure_disconnected()?;
        let session =
            LinkSession::from_parts(label.into(), reader, writer, &self.config, self.events.clone());
        self.session = Some(session);
        Ok(())
    }

    /// Close the session, if any. Safe to call on a degraded session.
    pub async fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            session.close().await;
        }
    }

    /// Handle that aborts an in-flight upload from another task. Follow
    /// it with [`ChannelRouter::disconnect`].
    pub fn abort_handle(&self) -> Option<CancellationToken> {
        self.session.as_ref().map(LinkSession::abort_handle)
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    pub fn phase(&self) -> SessionPhase {
        self.session
            .as_ref()
            .map(LinkSession::phase)
            .unwrap_or_default()
    }

    /// Send a chat line and echo it locally.
    pub async fn send_text(&self, line: &str) -> Result<(), LinkError> {
        let session = self.session()?;
        session.write_raw(&encode_text(line)).await?;
        self.emit(LinkEvent::TextSent {
            text: line.to_string(),
        })
        .await;
        Ok(())
    }

    /// Upload `asset`. `None` means nothing has been compressed yet.
    ///
    /// Oversized payloads are rejected before any byte is written.
    pub async fn send_image(&self, asset: Option<&CompressedAsset>) -> Result<(), LinkError> {
        let asset = asset.ok_or(LinkError::NoAsset)?;
        let session = self.session()?;
        let upload = ImageUpload::with_chunk_size(asset, self.config.upload.chunk_size)?;
        info!(fingerprint = %asset.fingerprint(), size = asset.len(), "sending image");
        session.upload_image(&upload).await
    }

    /// Compress `image` on the blocking pool and report the outcome on
    /// the event channel. A failure leaves any previous asset untouched.
    pub async fn compress(&self, image: Arc<RawImage>) -> Result<CompressedAsset, ImageError> {
        let budget = self.budget;
        let source = Arc::clone(&image);
        let result = tokio::task::spawn_blocking(move || compress::compress(&source, &budget))
            .await
            .unwrap_or_else(|e| Err(ImageError::Encode(format!("compression task failed: {e}"))));

        let event = match &result {
            Ok(asset) => {
                let report = CompressionReport::new(&image, asset);
                info!(
                    original = report.original_size_bytes,
                    compressed = report.compressed_size_bytes,
                    quality = report.quality,
                    fingerprint = %report.fingerprint,
                    "image compressed"
                );
                if asset.len() > self.budget.max_bytes {
                    warn!(size = asset.len(), "compressed image is still over budget");
                }
                LinkEvent::CompressionResult(report)
            }
            Err(e) => {
                warn!("compression failed: {e}");
                LinkEvent::CompressionFailed {
                    reason: e.to_string(),
                }
            }
        };
        self.emit(event).await;
        result
    }

    async fn emit(&self, event: LinkEvent) {
        if self.events.send(event).await.is_err() {
            trace!("event receiver dropped");
        }
    }

    fn session(&self) -> Result<&LinkSession, LinkError> {
        self.session.as_ref().ok_or(LinkError::NotConnected)
    }

    fn ensure_disconnected(&self) -> Result<(), LinkError> {
        match &self.session {
            Some(s) => Err(LinkError::AlreadyConnected(s.port().to_string())),
            None => Ok(()),
        }
    }
}
