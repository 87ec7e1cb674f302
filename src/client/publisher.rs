//! Sensor feed publisher
//!
//! Pushes readings for one sensor to a sensor server.

use bytes::Bytes;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::ToSocketAddrs;

use crate::error::Result;
use crate::protocol::{Frame, FrameReader, FrameWriter, HandshakeRequest};

/// Publishing side of a sensor feed
///
/// # Example
/// ```no_run
/// use sensorcast::client::FeedPublisher;
///
/// # async fn example() -> sensorcast::error::Result<()> {
/// let mut publisher = FeedPublisher::connect("127.0.0.1:8080", "thermo").await?;
/// publisher.send(r#"{"value": 21.5}"#).await?;
/// publisher.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct FeedPublisher {
    sensor_id: String,
    // Kept so the server does not see a half-closed socket
    _reader: FrameReader<OwnedReadHalf>,
    writer: FrameWriter<OwnedWriteHalf>,
}

impl FeedPublisher {
    /// Connect to a server and start publishing to `sensor_id`
    ///
    /// Fails with `Error::Rejected` if the server does not know the sensor.
    pub async fn connect<A: ToSocketAddrs>(addr: A, sensor_id: &str) -> Result<Self> {
        let request = HandshakeRequest::Publish {
            sensor: sensor_id.to_string(),
        };
        let (reader, writer, sensor_id) = super::connect(addr, &request).await?;

        tracing::debug!(sensor = %sensor_id, "Publisher connected");

        Ok(Self {
            sensor_id,
            _reader: reader,
            writer,
        })
    }

    /// Sensor this publisher writes to
    pub fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    /// Publish one payload
    pub async fn send(&mut self, payload: impl Into<Bytes>) -> Result<()> {
        self.writer.write_frame(&Frame::Data(payload.into())).await
    }

    /// Send a keepalive so the server's read timeout does not expire
    pub async fn ping(&mut self) -> Result<()> {
        self.writer.write_frame(&Frame::Ping).await
    }

    /// Finish publishing
    pub async fn close(mut self) -> Result<()> {
        self.writer.write_frame(&Frame::Close).await?;
        self.writer.shutdown().await
    }
}
