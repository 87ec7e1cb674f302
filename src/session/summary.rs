//! Session outcome reporting

use std::fmt;
use std::time::Duration;

use crate::registry::RegistryError;

/// Why a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    /// The client's stream was closed (client or sensor removed)
    StreamClosed,
    /// The peer closed the connection
    PeerClosed,
    /// A write to the peer failed
    WriteFailed(String),
    /// A read from the peer failed
    ReadFailed(String),
    /// A read or write exceeded its deadline
    Timeout,
    /// The registry refused a publish
    Rejected(RegistryError),
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndReason::StreamClosed => write!(f, "stream closed"),
            EndReason::PeerClosed => write!(f, "peer closed"),
            EndReason::WriteFailed(e) => write!(f, "write failed: {}", e),
            EndReason::ReadFailed(e) => write!(f, "read failed: {}", e),
            EndReason::Timeout => write!(f, "timed out"),
            EndReason::Rejected(e) => write!(f, "rejected: {}", e),
        }
    }
}

/// What a session did before it ended
#[derive(Debug, Clone)]
pub struct SessionSummary {
    /// Payloads written to a subscriber
    pub delivered: u64,
    /// Keepalive probes written to a subscriber
    pub pings: u64,
    /// Payloads the transport refused to carry (e.g. over its size limit)
    pub skipped: u64,
    /// Payloads published by a publisher
    pub published: u64,
    /// How long the session ran
    pub duration: Duration,
    /// Why it ended
    pub reason: EndReason,
}

impl SessionSummary {
    pub(super) fn new(reason: EndReason) -> Self {
        Self {
            delivered: 0,
            pings: 0,
            skipped: 0,
            published: 0,
            duration: Duration::ZERO,
            reason,
        }
    }

    /// Check if the session ended without a transport or registry failure
    pub fn is_clean(&self) -> bool {
        matches!(self.reason, EndReason::StreamClosed | EndReason::PeerClosed)
    }
}
