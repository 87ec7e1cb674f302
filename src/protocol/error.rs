//! Protocol error types

/// Error type for framing and handshake parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame type byte is not recognized
    UnknownFrameType(u8),
    /// Frame payload exceeds the maximum size
    FrameTooLarge(usize),
    /// Handshake line is malformed
    InvalidHandshake(String),
    /// Handshake line exceeds the maximum length
    HandshakeTooLong,
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::UnknownFrameType(t) => write!(f, "Unknown frame type: 0x{:02x}", t),
            ProtocolError::FrameTooLarge(len) => write!(f, "Frame too large: {} bytes", len),
            ProtocolError::InvalidHandshake(line) => write!(f, "Invalid handshake: {:?}", line),
            ProtocolError::HandshakeTooLong => write!(f, "Handshake line too long"),
        }
    }
}

impl std::error::Error for ProtocolError {}
