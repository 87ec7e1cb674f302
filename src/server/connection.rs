//! Per-connection handler
//!
//! Performs the handshake, then hands the connection to a publisher or
//! subscriber session until it ends.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::{Error, Result};
use crate::protocol::{Frame, FrameReader, FrameWriter, HandshakeRequest, HandshakeResponse};
use crate::registry::{RegistryError, StreamManager};
use crate::session::{
    PublisherSession, SessionContext, SessionRole, SessionSummary, SubscriberSession,
};

use super::config::ServerConfig;

/// Reason sent to the peer when the registry rejects a handshake
fn reject_reason(err: &RegistryError) -> &'static str {
    if err.is_not_found() {
        "not found"
    } else if err.is_already_exists() {
        "already exists"
    } else {
        "closed"
    }
}

/// Read until the peer closes or sends a close frame
async fn wait_for_hangup(reader: &mut FrameReader<OwnedReadHalf>) {
    loop {
        match reader.read_frame().await {
            Ok(Frame::Close) | Err(_) => return,
            Ok(_) => continue,
        }
    }
}

/// A single accepted TCP connection
pub struct Connection {
    session_id: u64,
    peer_addr: SocketAddr,
    config: Arc<ServerConfig>,
    registry: Arc<StreamManager>,
    reader: FrameReader<OwnedReadHalf>,
    writer: FrameWriter<OwnedWriteHalf>,
}

impl Connection {
    /// Wrap an accepted socket
    pub fn new(
        session_id: u64,
        socket: TcpStream,
        peer_addr: SocketAddr,
        config: Arc<ServerConfig>,
        registry: Arc<StreamManager>,
    ) -> Self {
        let (read_half, write_half) = socket.into_split();
        Self {
            session_id,
            peer_addr,
            reader: FrameReader::new(read_half, config.buffer_size),
            writer: FrameWriter::new(write_half, config.buffer_size),
            config,
            registry,
        }
    }

    async fn reject(&mut self, reason: &str) -> Result<()> {
        let line = HandshakeResponse::Err(reason.to_string()).to_line();
        self.writer.write_line(&line).await?;
        self.writer.shutdown().await
    }

    async fn accept(&mut self, id: &str) -> Result<()> {
        let line = HandshakeResponse::Ok(id.to_string()).to_line();
        self.writer.write_line(&line).await
    }

    /// Run the connection to completion
    pub async fn run(mut self) -> Result<SessionSummary> {
        let handshake_timeout = self.config.handshake_timeout;
        let line = timeout(handshake_timeout, self.reader.read_line())
            .await
            .map_err(|_| Error::Timeout(handshake_timeout))??;

        let request = match HandshakeRequest::parse(&line) {
            Ok(request) => request,
            Err(e) => {
                let _ = self.reject("bad handshake").await;
                return Err(e.into());
            }
        };

        match request {
            HandshakeRequest::Publish { sensor } => self.run_publisher(sensor).await,
            HandshakeRequest::Subscribe { sensor, client } => {
                let client = client.unwrap_or_else(|| format!("client-{}", self.session_id));
                self.run_subscriber(sensor, client).await
            }
        }
    }

    async fn run_publisher(mut self, sensor: String) -> Result<SessionSummary> {
        if !self.registry.contains(&sensor) {
            let err = RegistryError::SensorNotFound(sensor);
            let _ = self.reject(reject_reason(&err)).await;
            return Err(err.into());
        }
        self.accept(&sensor).await?;

        let ctx = SessionContext::new(self.session_id, sensor, SessionRole::Publisher)
            .with_peer(self.peer_addr);
        let session = PublisherSession::new(
            ctx,
            Arc::clone(&self.registry),
            self.config.session.clone(),
        );

        let summary = session.run(&mut self.reader).await;
        let _ = self.writer.shutdown().await;
        Ok(summary)
    }

    async fn run_subscriber(mut self, sensor: String, client: String) -> Result<SessionSummary> {
        let guard = match self.registry.attach_client(&sensor, &client) {
            Ok(guard) => guard,
            Err(e) => {
                let _ = self.reject(reject_reason(&e)).await;
                return Err(e.into());
            }
        };
        // From here on the guard owns the registration, including on `?`
        self.accept(&client).await?;

        let ctx = SessionContext::new(self.session_id, sensor, SessionRole::Subscriber)
            .with_peer(self.peer_addr);
        let session = SubscriberSession::new(ctx, guard, self.config.session.clone());

        let Connection {
            session_id,
            mut reader,
            mut writer,
            ..
        } = self;

        tokio::select! {
            summary = session.run(&mut writer) => Ok(summary),
            _ = wait_for_hangup(&mut reader) => {
                tracing::debug!(session_id = session_id, client = %client, "Subscriber hung up");
                Err(Error::ConnectionClosed)
            }
        }
    }
}
