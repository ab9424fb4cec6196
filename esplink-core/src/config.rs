//! Runtime configuration for a link session.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::event::DEFAULT_EVENT_BUFFER;
use crate::protocol::DEFAULT_CHUNK_SIZE;

/// Serial port parameters. The line is always 8N1 without flow control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM3`.
    pub port: String,
    pub baud_rate: u32,
    /// Read timeout applied to the port at open time.
    pub read_timeout_ms: u64,
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: 115_200,
            read_timeout_ms: 100,
        }
    }
}

/// Timing and sizing of the image upload sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadPacing {
    /// Wait after the command line so the peer can enter receive mode.
    pub settle_delay_ms: u64,
    /// Wait after every payload chunk.
    pub pacing_delay_ms: u64,
    /// Payload bytes per write.
    pub chunk_size: usize,
    /// Emit progress whenever the bytes sent reach a multiple of this.
    pub progress_interval: usize,
}

impl UploadPacing {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn pacing_delay(&self) -> Duration {
        Duration::from_millis(self.pacing_delay_ms)
    }

    /// No delays; for loopback transports and tests.
    pub fn immediate() -> Self {
        Self {
            settle_delay_ms: 0,
            pacing_delay_ms: 0,
            ..Self::default()
        }
    }
}

impl Default for UploadPacing {
    fn default() -> Self {
        Self {
            settle_delay_ms: 500,
            pacing_delay_ms: 10,
            chunk_size: DEFAULT_CHUNK_SIZE,
            progress_interval: 512,
        }
    }
}

/// Session-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Label attached to every inbound line.
    pub peer_label: String,
    /// Capacity of the event channel.
    pub event_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            peer_label: "ESP".into(),
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

/// Everything a [`LinkSession`](crate::network::LinkSession) needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub serial: SerialConfig,
    pub upload: UploadPacing,
    pub session: SessionConfig,
}
