//! Binary frame codec
//!
//! Every frame after the handshake has a fixed 5-byte header:
//!
//! ```text
//! +--------+----------------------+------------------+
//! | type   | length (u32, BE)     | payload          |
//! | 1 byte | 4 bytes              | `length` bytes   |
//! +--------+----------------------+------------------+
//! ```
//!
//! Payloads are opaque; only `Data` frames carry one.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::error::ProtocolError;
use super::{FRAME_HEADER_SIZE, MAX_FRAME_SIZE};

const TYPE_DATA: u8 = 0x01;
const TYPE_PING: u8 = 0x02;
const TYPE_PONG: u8 = 0x03;
const TYPE_CLOSE: u8 = 0x04;

/// A single protocol frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Sensor payload
    Data(Bytes),
    /// Liveness probe
    Ping,
    /// Answer to a ping
    Pong,
    /// Orderly shutdown
    Close,
}

impl Frame {
    fn type_byte(&self) -> u8 {
        match self {
            Frame::Data(_) => TYPE_DATA,
            Frame::Ping => TYPE_PING,
            Frame::Pong => TYPE_PONG,
            Frame::Close => TYPE_CLOSE,
        }
    }

    /// Size of the encoded frame in bytes
    pub fn encoded_len(&self) -> usize {
        match self {
            Frame::Data(payload) => FRAME_HEADER_SIZE + payload.len(),
            _ => FRAME_HEADER_SIZE,
        }
    }

    /// Append the encoded frame to `buf`
    ///
    /// Payloads over `MAX_FRAME_SIZE` are rejected before anything is
    /// appended, so a failed encode leaves `buf` untouched.
    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        let len = match self {
            Frame::Data(payload) => payload.len(),
            _ => 0,
        };
        if len > MAX_FRAME_SIZE {
            return Err(ProtocolError::FrameTooLarge(len));
        }
        let header_len = u32::try_from(len).map_err(|_| ProtocolError::FrameTooLarge(len))?;

        buf.reserve(self.encoded_len());
        buf.put_u8(self.type_byte());
        buf.put_u32(header_len);
        if let Frame::Data(payload) = self {
            buf.put_slice(payload);
        }
        Ok(())
    }

    /// Try to decode one frame from the front of `buf`
    ///
    /// Returns `Ok(None)` if more data is needed; consumed bytes are removed
    /// from `buf` only when a whole frame is available.
    pub fn decode(buf: &mut BytesMut) -> Result<Option<Frame>, ProtocolError> {
        if buf.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }

        let frame_type = buf[0];
        let len = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]) as usize;

        if len > MAX_FRAME_SIZE {
            return Err(ProtocolError::FrameTooLarge(len));
        }
        if !matches!(frame_type, TYPE_DATA | TYPE_PING | TYPE_PONG | TYPE_CLOSE) {
            return Err(ProtocolError::UnknownFrameType(frame_type));
        }
        if buf.len() < FRAME_HEADER_SIZE + len {
            buf.reserve(FRAME_HEADER_SIZE + len - buf.len());
            return Ok(None);
        }

        buf.advance(FRAME_HEADER_SIZE);
        let payload = buf.split_to(len).freeze();

        Ok(Some(match frame_type {
            TYPE_DATA => Frame::Data(payload),
            TYPE_PING => Frame::Ping,
            TYPE_PONG => Frame::Pong,
            _ => Frame::Close,
        }))
    }
}
