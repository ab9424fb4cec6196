//! Lifecycle of a link session.
//!
//! ```text
//!   open() ──► Open ──(read/write error)──► Degraded
//!                │                              │
//!                └────────── close() ───────────┴──► Closed
//! ```
//!
//! A degraded session still accepts writes; the caller is expected to
//! close it and open a new one.

use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// The transport is open and both directions are healthy.
    Open {
        /// When the session was opened.
        since: Instant,
    },

    /// A read or write failed. Keeps the first failure reason.
    Degraded { reason: String },

    /// No transport. Initial and terminal state.
    #[default]
    Closed,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { .. } => write!(f, "Open"),
            Self::Degraded { reason } => write!(f, "Degraded ({reason})"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

impl SessionPhase {
    pub fn open() -> Self {
        Self::Open {
            since: Instant::now(),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// How long the session has been healthy. `None` unless `Open`.
    pub fn open_duration(&self) -> Option<Duration> {
        match self {
            Self::Open { since } => Some(since.elapsed()),
            _ => None,
        }
    }

    /// Record a link failure. Returns `true` if the phase changed.
    pub fn degrade(&mut self, reason: impl Into<String>) -> bool {
        if self.is_open() {
            *self = Self::Degraded {
                reason: reason.into(),
            };
            true
        } else {
            false
        }
    }
}
