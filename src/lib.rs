//! # sensorcast
//!
//! Fan-out streaming core for live sensor telemetry.
//!
//! Publishers push opaque payloads for a sensor into a shared
//! [`StreamManager`]; every attached subscriber owns a bounded buffer that
//! keeps only the most recent payloads, so slow subscribers lose their own
//! oldest data instead of stalling the publisher or each other.
//!
//! ```no_run
//! use std::sync::Arc;
//! use sensorcast::StreamManager;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = Arc::new(StreamManager::new());
//! manager.register("thermo")?;
//!
//! let client = manager.attach_client("thermo", "dashboard")?;
//! manager.publish("thermo", r#"{"value": 21.5}"#)?;
//!
//! let mut feed = client.subscribe();
//! while let Some(payload) = feed.next().await {
//!     println!("{:?}", payload);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The [`server`] and [`client`] modules provide a small TCP transport for
//! driving the core end-to-end; any other transport can reuse the
//! [`session`] workers through the [`FrameSink`](session::FrameSink) and
//! [`FrameSource`](session::FrameSource) traits.

pub mod client;
pub mod error;
pub mod monitor;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;
pub mod stats;
pub mod stream;

pub use error::{Error, Result};
pub use registry::{ClientGuard, RegistryConfig, RegistryError, StreamManager};
pub use server::{SensorServer, ServerConfig};
pub use session::SessionConfig;
pub use stream::{Stream, StreamState, Subscription};
