//! Transport seams for sessions
//!
//! Sessions never touch sockets directly. A subscriber session writes through
//! a [`FrameSink`] and a publisher session reads through a [`FrameSource`],
//! so the same workers drive TCP, WebSocket, or in-memory transports.

use std::future::Future;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{Error, Result};
use crate::protocol::{Frame, FrameReader, FrameWriter};

/// Outbound half of a subscriber connection
pub trait FrameSink: Send {
    /// Deliver one payload
    fn send_data(&mut self, payload: Bytes) -> impl Future<Output = Result<()>> + Send;

    /// Send a liveness probe
    fn send_ping(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Tell the peer no more data will follow
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Something received from a publisher connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A payload to publish
    Payload(Bytes),
    /// Liveness traffic with no payload
    Keepalive,
    /// The peer is done
    Closed,
}

/// Inbound half of a publisher connection
pub trait FrameSource: Send {
    /// Wait for the next inbound item
    fn next_inbound(&mut self) -> impl Future<Output = Result<Inbound>> + Send;
}

impl<W> FrameSink for FrameWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send_data(&mut self, payload: Bytes) -> Result<()> {
        self.write_frame(&Frame::Data(payload)).await
    }

    async fn send_ping(&mut self) -> Result<()> {
        self.write_frame(&Frame::Ping).await
    }

    async fn close(&mut self) -> Result<()> {
        self.write_frame(&Frame::Close).await?;
        self.shutdown().await
    }
}

impl<R> FrameSource for FrameReader<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn next_inbound(&mut self) -> Result<Inbound> {
        match self.read_frame().await {
            Ok(Frame::Data(payload)) => Ok(Inbound::Payload(payload)),
            Ok(Frame::Ping) | Ok(Frame::Pong) => Ok(Inbound::Keepalive),
            Ok(Frame::Close) | Err(Error::ConnectionClosed) => Ok(Inbound::Closed),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writer_reader_pair() {
        let (a, b) = tokio::io::duplex(1024);
        let mut sink = FrameWriter::new(a, 64);
        let mut source = FrameReader::new(b, 64);

        sink.send_data(Bytes::from_static(b"42")).await.unwrap();
        sink.send_ping().await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(
            source.next_inbound().await.unwrap(),
            Inbound::Payload(Bytes::from_static(b"42"))
        );
        assert_eq!(source.next_inbound().await.unwrap(), Inbound::Keepalive);
        assert_eq!(source.next_inbound().await.unwrap(), Inbound::Closed);
    }

    #[tokio::test]
    async fn test_hangup_is_closed() {
        let (a, b) = tokio::io::duplex(64);
        let mut source = FrameReader::new(b, 64);
        drop(a);

        assert_eq!(source.next_inbound().await.unwrap(), Inbound::Closed);
    }
}
