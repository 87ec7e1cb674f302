//! Sensor stream registry
//!
//! The registry maps sensor ids to entries and fans published payloads out to
//! every attached client. Each client owns a bounded drop-oldest buffer, so a
//! slow consumer only ever loses its own oldest data and never slows the
//! publisher or other clients.
//!
//! # Architecture
//!
//! ```text
//!                        Arc<StreamManager>
//!                  ┌──────────────────────────────┐
//!                  │ sensors: HashMap<Id,          │
//!                  │   SensorEntry {               │
//!                  │     base: Stream,             │
//!                  │     clients: HashMap<Id,      │
//!                  │       Stream>,                │
//!                  │   }                           │
//!                  │ >                             │
//!                  └──────────────┬───────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!    [Publisher]             [Client c1]             [Client c2]
//!    manager.publish()       stream.recv()           stream.recv()
//!         │                       ▲                       ▲
//!         └──► entry.publish() ───┴── send() per client ──┘
//! ```
//!
//! # Lifecycle
//!
//! Sensor creation and deletion must call [`StreamManager::register`] and
//! [`StreamManager::unregister`] symmetrically. Unregistering closes every
//! buffer of the sensor, which ends any pending receive. Connection handlers
//! attach with [`StreamManager::attach_client`] and hold the returned
//! [`ClientGuard`] for the lifetime of the connection.

pub mod config;
pub mod entry;
pub mod error;
pub mod guard;
pub mod store;

pub use config::RegistryConfig;
pub use entry::SensorEntry;
pub use error::RegistryError;
pub use guard::ClientGuard;
pub use store::StreamManager;
