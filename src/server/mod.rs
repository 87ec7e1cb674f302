//! TCP server for publishers and subscribers
//!
//! Each accepted connection runs on its own task: a one-line handshake picks
//! the role, then the connection is driven by a publisher or subscriber
//! session until it ends.

pub mod config;
pub mod connection;
pub mod listener;

pub use config::ServerConfig;
pub use connection::Connection;
pub use listener::SensorServer;
