//! Connection workers
//!
//! One worker task runs per connection. A [`PublisherSession`] moves
//! payloads from a transport into the registry; a [`SubscriberSession`]
//! moves payloads from a client's stream out to a transport, with periodic
//! keepalive probes. Both are generic over the transport through the
//! [`FrameSource`] and [`FrameSink`] traits.

pub mod config;
pub mod context;
pub mod publisher;
pub mod subscriber;
pub mod summary;
pub mod transport;

pub use config::SessionConfig;
pub use context::{SessionContext, SessionRole};
pub use publisher::PublisherSession;
pub use subscriber::SubscriberSession;
pub use summary::{EndReason, SessionSummary};
pub use transport::{FrameSink, FrameSource, Inbound};
