//! Clients for the bundled TCP transport
//!
//! Provides client-side helpers for:
//! - Publishing readings for a sensor
//! - Subscribing to a sensor's live feed

pub mod publisher;
pub mod subscriber;

pub use publisher::FeedPublisher;
pub use subscriber::FeedSubscriber;

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::error::{Error, Result};
use crate::protocol::{FrameReader, FrameWriter, HandshakeRequest, HandshakeResponse};

const CLIENT_BUFFER_SIZE: usize = 16 * 1024;

/// Connect and perform the handshake, returning the id the server accepted
async fn connect<A: ToSocketAddrs>(
    addr: A,
    request: &HandshakeRequest,
) -> Result<(FrameReader<OwnedReadHalf>, FrameWriter<OwnedWriteHalf>, String)> {
    let socket = TcpStream::connect(addr).await?;
    socket.set_nodelay(true)?;

    let (read_half, write_half) = socket.into_split();
    let mut reader = FrameReader::new(read_half, CLIENT_BUFFER_SIZE);
    let mut writer = FrameWriter::new(write_half, CLIENT_BUFFER_SIZE);

    writer.write_line(&request.to_line()).await?;
    let line = reader.read_line().await?;

    match HandshakeResponse::parse(&line)? {
        HandshakeResponse::Ok(id) => Ok((reader, writer, id)),
        HandshakeResponse::Err(reason) => Err(Error::Rejected(reason)),
    }
}
