//! Sensor feed subscriber
//!
//! Receives live readings for one sensor and answers keepalive probes.

use bytes::Bytes;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::ToSocketAddrs;

use crate::error::{Error, Result};
use crate::protocol::{Frame, FrameReader, FrameWriter, HandshakeRequest};

/// Receiving side of a sensor feed
pub struct FeedSubscriber {
    client_id: String,
    reader: FrameReader<OwnedReadHalf>,
    writer: FrameWriter<OwnedWriteHalf>,
    pings: u64,
}

impl FeedSubscriber {
    /// Connect to a server and subscribe to `sensor_id`
    ///
    /// Without a client id, the server assigns one; see [`client_id`](Self::client_id).
    pub async fn connect<A: ToSocketAddrs>(
        addr: A,
        sensor_id: &str,
        client_id: Option<&str>,
    ) -> Result<Self> {
        let request = HandshakeRequest::Subscribe {
            sensor: sensor_id.to_string(),
            client: client_id.map(str::to_string),
        };
        let (reader, writer, client_id) = super::connect(addr, &request).await?;

        tracing::debug!(sensor = %sensor_id, client = %client_id, "Subscriber connected");

        Ok(Self {
            client_id,
            reader,
            writer,
            pings: 0,
        })
    }

    /// Client id accepted by the server
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Keepalive probes received so far
    pub fn pings(&self) -> u64 {
        self.pings
    }

    /// Wait for the next payload
    ///
    /// Returns `None` when the server ends the feed.
    pub async fn recv(&mut self) -> Result<Option<Bytes>> {
        loop {
            match self.reader.read_frame().await {
                Ok(Frame::Data(payload)) => return Ok(Some(payload)),
                Ok(Frame::Ping) => {
                    self.pings += 1;
                    self.writer.write_frame(&Frame::Pong).await?;
                }
                Ok(Frame::Pong) => continue,
                Ok(Frame::Close) | Err(Error::ConnectionClosed) => return Ok(None),
                Err(e) => return Err(e),
            }
        }
    }

    /// Stop receiving
    pub async fn close(mut self) -> Result<()> {
        self.writer.write_frame(&Frame::Close).await?;
        self.writer.shutdown().await
    }
}
