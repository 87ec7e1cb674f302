//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

use crate::registry::RegistryConfig;
use crate::session::SessionConfig;

/// Default listening port
pub const DEFAULT_PORT: u16 = 8080;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// The handshake line must arrive within this time
    pub handshake_timeout: Duration,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,

    /// Application-level read/write buffer size
    pub buffer_size: usize,

    /// Publisher and subscriber session options
    pub session: SessionConfig,

    /// Stream registry options
    pub registry: RegistryConfig,

    /// Sensors registered when the server starts
    pub sensors: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_connections: 0, // Unlimited
            handshake_timeout: Duration::from_secs(10),
            tcp_nodelay: true,
            buffer_size: 16 * 1024,
            session: SessionConfig::default(),
            registry: RegistryConfig::default(),
            sensors: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set handshake timeout
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set session options
    pub fn session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    /// Set the per-stream buffer capacity
    pub fn stream_capacity(mut self, capacity: usize) -> Self {
        self.registry = self.registry.stream_capacity(capacity);
        self
    }

    /// Register a sensor at startup
    pub fn sensor(mut self, sensor_id: impl Into<String>) -> Self {
        self.sensors.push(sensor_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), DEFAULT_PORT);
        assert_eq!(config.max_connections, 0);
        assert!(config.tcp_nodelay);
        assert!(config.sensors.is_empty());
        assert_eq!(config.session.keepalive_interval, Duration::from_secs(2));
    }

    #[test]
    fn test_with_addr() {
        let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
        let config = ServerConfig::with_addr(addr);

        assert_eq!(config.bind_addr.port(), 9090);
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:8081".parse().unwrap();
        let config = ServerConfig::default()
            .bind(addr)
            .max_connections(50)
            .handshake_timeout(Duration::from_secs(3))
            .stream_capacity(0)
            .session(SessionConfig::default().coalesce(true))
            .sensor("thermo")
            .sensor("camera");

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.max_connections, 50);
        assert_eq!(config.handshake_timeout, Duration::from_secs(3));
        assert_eq!(config.registry.stream_capacity, 1);
        assert!(config.session.coalesce);
        assert_eq!(config.sensors, vec!["thermo", "camera"]);
    }
}
