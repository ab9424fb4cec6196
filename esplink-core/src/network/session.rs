//! A serial link to one peer.
//!
//! ```text
//!                 ┌──────────── LinkSession ────────────┐
//! write_raw ─────►│ Mutex<writer> ──────────────────────┼──► port (tx)
//! upload_image ──►│   (held for the whole upload)       │
//!                 │                                     │
//! events ◄────────┼── reader task ◄── FramedRead ◄──────┼─── port (rx)
//!                 └─────────────────────────────────────┘
//! ```
//!
//! The reader task owns the read half and talks to the outside only
//! through the event channel. All writes go through one lock, so an
//! image upload is never interleaved with another send.

use std::sync::Arc;

use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, StopBits};
use tokio_util::codec::FramedRead;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, trace, warn};

use crate::codec::InboundLineCodec;
use crate::config::{LinkConfig, UploadPacing};
use crate::error::LinkError;
use crate::event::{EventSender, LinkEvent};
use crate::router::{InboundMessage, classify_inbound};
use crate::state::SessionPhase;

pub(crate) type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

pub struct LinkSession {
    port: String,
    pub(crate) writer: Mutex<BoxedWriter>,
    reader: Option<JoinHandle<()>>,
    pub(crate) cancel: CancellationToken,
    _cancel_on_drop: DropGuard,
    pub(crate) phase: Arc<watch::Sender<SessionPhase>>,
    pub(crate) events: EventSender,
    pub(crate) pacing: UploadPacing,
}

impl std::fmt::Debug for LinkSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSession")
            .field("port", &self.port)
            .field("phase", &*self.phase.borrow())
            .finish_non_exhaustive()
    }
}

impl LinkSession {
    /// Open the configured serial port and start the reader task.
    ///
    /// Must be called from within a Tokio runtime. On failure nothing is
    /// spawned and no state is kept.
    pub fn open(config: &LinkConfig, events: EventSender) -> Result<Self, LinkError> {
        let serial = &config.serial;
        let stream = tokio_serial::new(&serial.port, serial.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(serial.read_timeout())
            .open_native_async()
            .map_err(|source| LinkError::TransportOpen {
                port: serial.port.clone(),
                source,
            })?;

        info!(port = %serial.port, baud = serial.baud_rate, "serial port opened");
        Ok(Self::from_stream(serial.port.clone(), stream, config, events))
    }

    /// Run a session over any duplex byte stream.
    pub fn from_stream<S>(label: String, stream: S, config: &LinkConfig, events: EventSender) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        Self::from_parts(label, reader, writer, config, events)
    }

    /// Run a session over separate read and write halves.
    pub fn from_parts<R, W>(
        label: String,
        reader: R,
        writer: W,
        config: &LinkConfig,
        events: EventSender,
    ) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let cancel = CancellationToken::new();
        let phase = Arc::new(watch::Sender::new(SessionPhase::open()));

        let lines = FramedRead::new(reader, InboundLineCodec::new());
        let reader = tokio::spawn(read_loop(
            lines,
            config.session.peer_label.clone(),
            cancel.clone(),
            events.clone(),
            Arc::clone(&phase),
        ));

        Self {
            port: label,
            writer: Mutex::new(Box::new(writer)),
            reader: Some(reader),
            _cancel_on_drop: cancel.clone().drop_guard(),
            cancel,
            phase,
            events,
            pacing: config.upload,
        }
    }

    /// Name of the underlying port.
    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase.borrow().clone()
    }

    /// Token that aborts an in-flight upload and stops the reader.
    /// `close` still has to run to release the port.
    pub fn abort_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Watch phase changes, e.g. to grey out send controls.
    pub fn subscribe_phase(&self) -> watch::Receiver<SessionPhase> {
        self.phase.subscribe()
    }

    /// Write `bytes` and flush. Waits for any in-flight upload first.
    pub async fn write_raw(&self, bytes: &[u8]) -> Result<(), LinkError> {
        let mut writer = self.writer.lock().await;
        self.write_locked(&mut writer, bytes).await
    }

    /// Write while already holding the writer lock. A failure degrades
    /// the session and is reported on the event channel.
    pub(crate) async fn write_locked(
        &self,
        writer: &mut BoxedWriter,
        bytes: &[u8],
    ) -> Result<(), LinkError> {
        let result: std::io::Result<()> = async {
            writer.write_all(bytes).await?;
            writer.flush().await
        }
        .await;

        if let Err(e) = result {
            warn!(port = %self.port, "write failed: {e}");
            let message = format!("error writing to serial: {e}");
            self.phase.send_modify(|p| {
                p.degrade(message.clone());
            });
            self.emit(LinkEvent::LinkError { message }).await;
            return Err(e.into());
        }
        trace!(len = bytes.len(), "wrote");
        Ok(())
    }

    pub(crate) async fn emit(&self, event: LinkEvent) {
        if self.events.send(event).await.is_err() {
            trace!("event receiver dropped");
        }
    }

    /// Stop the reader, wait for it to exit, then release the port.
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(reader) = self.reader.take() {
            if let Err(e) = reader.await {
                warn!("reader task ended abnormally: {e}");
            }
        }

        let mut writer = self.writer.into_inner();
        if let Err(e) = writer.shutdown().await {
            debug!("shutdown on close: {e}");
        }
        drop(writer);

        self.phase.send_replace(SessionPhase::Closed);
        info!(port = %self.port, "link closed");
    }
}

// ── Reader task ──────────────────────────────────────────────────

async fn read_loop<R>(
    mut lines: FramedRead<R, InboundLineCodec>,
    peer_label: String,
    cancel: CancellationToken,
    events: EventSender,
    phase: Arc<watch::Sender<SessionPhase>>,
) where
    R: AsyncRead + Unpin,
{
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = lines.next() => next,
        };

        let event = match next {
            Some(Ok(line)) if line.is_empty() => continue,
            Some(Ok(line)) => match classify_inbound(line) {
                InboundMessage::Text(text) => LinkEvent::InboundText {
                    peer_label: peer_label.clone(),
                    text,
                },
            },
            Some(Err(e)) => {
                warn!("read failed: {e}");
                fail(&phase, format!("error reading from serial: {e}"))
            }
            None => {
                warn!("link closed by peer");
                fail(&phase, "link closed by peer".to_string())
            }
        };

        let terminal = matches!(event, LinkEvent::LinkError { .. });
        tokio::select! {
            _ = cancel.cancelled() => break,
            sent = events.send(event) => {
                if sent.is_err() {
                    debug!("event receiver dropped; stopping reader");
                    break;
                }
            }
        }
        if terminal {
            break;
        }
    }
    debug!("read loop stopped");
}

fn fail(phase: &watch::Sender<SessionPhase>, message: String) -> LinkEvent {
    phase.send_modify(|p| {
        p.degrade(message.clone());
    });
    LinkEvent::LinkError { message }
}
