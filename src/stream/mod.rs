//! Bounded lossy streams
//!
//! A [`Stream`] is the unit of buffering between one producer and one
//! consumer. It keeps at most `capacity` payloads and evicts the oldest one
//! when a new payload arrives on a full buffer ("most recent wins").
//!
//! ```text
//!   send("d") on a full capacity-3 buffer
//!
//!   [a][b][c]  ──pop_front──►  [b][c]  ──push_back──►  [b][c][d]
//! ```
//!
//! Sends never suspend. Receivers either poll (non-blocking) or wait on
//! [`Stream::recv`], which suspends until a payload arrives or the stream is
//! closed.

pub mod buffer;
pub mod subscription;

pub use buffer::{Stream, StreamState};
pub use subscription::Subscription;
