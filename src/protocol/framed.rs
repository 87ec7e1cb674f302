//! Framed I/O over async byte streams
//!
//! Reading and writing are separate types so a connection can be split and
//! each half driven by its own task or `select!` branch.

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

use super::error::ProtocolError;
use super::frame::Frame;
use super::MAX_HANDSHAKE_LINE;

/// Reads handshake lines and frames from a byte stream
#[derive(Debug)]
pub struct FrameReader<R> {
    io: R,
    buf: BytesMut,
}

impl<R> FrameReader<R>
where
    R: AsyncRead + Unpin,
{
    /// Wrap the read half of a connection
    pub fn new(io: R, buffer_size: usize) -> Self {
        Self {
            io,
            buf: BytesMut::with_capacity(buffer_size),
        }
    }

    async fn fill(&mut self) -> Result<()> {
        let n = self.io.read_buf(&mut self.buf).await?;
        if n == 0 {
            return Err(Error::ConnectionClosed);
        }
        Ok(())
    }

    /// Read one newline-terminated handshake line
    pub async fn read_line(&mut self) -> Result<String> {
        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
                let line = self.buf.split_to(pos + 1);
                let text = String::from_utf8_lossy(&line[..pos]);
                return Ok(text.trim_end_matches('\r').to_string());
            }
            if self.buf.len() > MAX_HANDSHAKE_LINE {
                return Err(ProtocolError::HandshakeTooLong.into());
            }
            self.fill().await?;
        }
    }

    /// Read the next frame
    ///
    /// Returns `Error::ConnectionClosed` if the peer hangs up.
    pub async fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = Frame::decode(&mut self.buf)? {
                return Ok(frame);
            }
            self.fill().await?;
        }
    }
}

/// Writes handshake lines and frames to a byte stream
#[derive(Debug)]
pub struct FrameWriter<W> {
    io: W,
    buf: BytesMut,
}

impl<W> FrameWriter<W>
where
    W: AsyncWrite + Unpin,
{
    /// Wrap the write half of a connection
    pub fn new(io: W, buffer_size: usize) -> Self {
        Self {
            io,
            buf: BytesMut::with_capacity(buffer_size),
        }
    }

    /// Write one handshake line
    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        self.io.write_all(line.as_bytes()).await?;
        self.io.flush().await?;
        Ok(())
    }

    /// Write one frame and flush it
    ///
    /// An oversized frame fails with `FrameTooLarge` and writes nothing, so
    /// the connection stays usable.
    pub async fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        frame.encode(&mut self.buf)?;
        while self.buf.has_remaining() {
            let n = self.io.write(&self.buf).await?;
            if n == 0 {
                return Err(Error::ConnectionClosed);
            }
            self.buf.advance(n);
        }
        self.io.flush().await?;
        Ok(())
    }

    /// Shut down the write half
    pub async fn shutdown(&mut self) -> Result<()> {
        self.io.shutdown().await?;
        Ok(())
    }
}
