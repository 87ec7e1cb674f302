//! Wire protocol for the bundled TCP transport
//!
//! The streaming core treats payloads as opaque bytes and owns no wire
//! format. This module is the adapter used by [`crate::server`] and
//! [`crate::client`]: a one-line text handshake followed by length-prefixed
//! binary frames.

pub mod error;
pub mod frame;
pub mod framed;
pub mod handshake;

pub use error::ProtocolError;
pub use frame::Frame;
pub use framed::{FrameReader, FrameWriter};
pub use handshake::{HandshakeRequest, HandshakeResponse};

/// Size of a frame header (type + length)
pub const FRAME_HEADER_SIZE: usize = 5;

/// Maximum payload size of a single frame (16 MiB)
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Maximum length of a handshake line
pub const MAX_HANDSHAKE_LINE: usize = 256;
