//! Session configuration

use std::time::Duration;

/// Shortest keepalive interval a session will use
pub const MIN_KEEPALIVE_INTERVAL: Duration = Duration::from_millis(1);

/// Timing and delivery options for publisher and subscriber sessions
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Interval between liveness probes sent to subscribers
    pub keepalive_interval: Duration,

    /// Maximum time a single write to a subscriber may take
    pub write_timeout: Duration,

    /// Maximum time to wait for the next frame from a publisher
    pub read_timeout: Duration,

    /// Deliver only the newest payload when a subscriber falls behind
    pub coalesce: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            keepalive_interval: Duration::from_secs(2),
            write_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
            coalesce: false,
        }
    }
}

impl SessionConfig {
    /// Set the keepalive interval
    ///
    /// Raised to at least [`MIN_KEEPALIVE_INTERVAL`].
    pub fn keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval.max(MIN_KEEPALIVE_INTERVAL);
        self
    }

    /// Set the per-write timeout
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the publisher read timeout
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Coalesce backlogs to the newest payload
    pub fn coalesce(mut self, coalesce: bool) -> Self {
        self.coalesce = coalesce;
        self
    }
}
