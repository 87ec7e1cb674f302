//! Session context
//!
//! Identifies a connection in logs and summaries.

use std::fmt;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Role of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    /// Pushes payloads into a sensor
    Publisher,
    /// Receives payloads from a sensor
    Subscriber,
}

impl fmt::Display for SessionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionRole::Publisher => write!(f, "publisher"),
            SessionRole::Subscriber => write!(f, "subscriber"),
        }
    }
}

/// Read-only information about a session
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Unique session ID
    pub session_id: u64,

    /// Remote peer address, if the transport has one
    pub peer_addr: Option<SocketAddr>,

    /// Sensor the session is bound to
    pub sensor_id: String,

    /// Publisher or subscriber
    pub role: SessionRole,

    /// When the session started
    pub started_at: Instant,
}

impl SessionContext {
    /// Create a new context
    pub fn new(session_id: u64, sensor_id: impl Into<String>, role: SessionRole) -> Self {
        Self {
            session_id,
            peer_addr: None,
            sensor_id: sensor_id.into(),
            role,
            started_at: Instant::now(),
        }
    }

    /// Attach the remote address
    pub fn with_peer(mut self, peer_addr: SocketAddr) -> Self {
        self.peer_addr = Some(peer_addr);
        self
    }

    /// Time since the session started
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context() {
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        let ctx = SessionContext::new(7, "thermo", SessionRole::Subscriber).with_peer(addr);

        assert_eq!(ctx.session_id, 7);
        assert_eq!(ctx.sensor_id, "thermo");
        assert_eq!(ctx.peer_addr, Some(addr));
        assert_eq!(ctx.role.to_string(), "subscriber");
    }
}
