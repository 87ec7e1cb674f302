//! Sensor stream server listener
//!
//! Handles TCP accept loop and spawns connection handlers.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::error::Result;
use crate::registry::StreamManager;
use crate::server::config::ServerConfig;
use crate::server::connection::Connection;

/// TCP server exposing the stream manager to publishers and subscribers
pub struct SensorServer {
    config: Arc<ServerConfig>,
    registry: Arc<StreamManager>,
    next_session_id: AtomicU64,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl SensorServer {
    /// Create a new server with its own stream manager
    ///
    /// Sensors listed in the configuration are registered immediately.
    pub fn new(config: ServerConfig) -> Self {
        let registry = Arc::new(StreamManager::with_config(config.registry.clone()));
        Self::with_registry(config, registry)
    }

    /// Create a new server around an existing stream manager
    ///
    /// Use this when other components (e.g. sensor CRUD handlers) must share
    /// the same manager to register and unregister sensors.
    pub fn with_registry(config: ServerConfig, registry: Arc<StreamManager>) -> Self {
        let registered = registry.register_sensors(&config.sensors);
        if registered > 0 {
            tracing::info!(sensors = registered, "Registered configured sensors");
        }

        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            config: Arc::new(config),
            registry,
            next_session_id: AtomicU64::new(1),
            connection_semaphore,
        }
    }

    /// Get a reference to the stream manager
    pub fn registry(&self) -> &Arc<StreamManager> {
        &self.registry
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Bind the configured address
    pub async fn bind(&self) -> Result<TcpListener> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "Sensor server listening");
        Ok(listener)
    }

    /// Run the server
    ///
    /// Fails only if the configured address cannot be bound; otherwise this
    /// method runs until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        let listener = self.bind().await?;
        self.accept_loop(&listener).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }

    /// Serve connections from an already bound listener until `shutdown` resolves
    ///
    /// On shutdown every sensor is unregistered, which ends all subscriber
    /// sessions.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let result = tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
        };

        self.registry.shutdown();
        result
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match Arc::clone(sem).try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        // Generate session ID
        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            session_id = session_id,
            peer = %peer_addr,
            "New connection"
        );

        if self.config.tcp_nodelay {
            if let Err(e) = socket.set_nodelay(true) {
                tracing::error!(error = %e, "Failed to configure socket");
                return;
            }
        }

        let config = Arc::clone(&self.config);
        let registry = Arc::clone(&self.registry);

        tokio::spawn(async move {
            // Held for the lifetime of the connection
            let _permit = permit;
            let connection = Connection::new(session_id, socket, peer_addr, config, registry);

            match connection.run().await {
                Ok(summary) => {
                    tracing::debug!(
                        session_id = session_id,
                        reason = %summary.reason,
                        "Connection finished"
                    );
                }
                Err(e) => {
                    tracing::debug!(
                        session_id = session_id,
                        error = %e,
                        "Connection error"
                    );
                }
            }

            tracing::debug!(session_id = session_id, "Connection closed");
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;
    use tokio::sync::oneshot;

    use super::*;
    use crate::client::{FeedPublisher, FeedSubscriber};
    use crate::error::Error;
    use crate::session::SessionConfig;

    async fn start(config: ServerConfig) -> (Arc<SensorServer>, SocketAddr, oneshot::Sender<()>) {
        let config = config.bind("127.0.0.1:0".parse().unwrap());
        let server = Arc::new(SensorServer::new(config));
        let listener = server.bind().await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();

        let task_server = Arc::clone(&server);
        tokio::spawn(async move {
            let _ = task_server
                .serve(listener, async {
                    let _ = rx.await;
                })
                .await;
        });

        (server, addr, tx)
    }

    async fn wait_for_clients(server: &SensorServer, sensor: &str, expected: usize) {
        for _ in 0..200 {
            if server.registry().lookup(sensor).map(|e| e.client_count()) == Some(expected) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("sensor {} never reached {} clients", sensor, expected);
    }

    #[tokio::test]
    async fn test_publish_subscribe_end_to_end() {
        let (server, addr, _shutdown) = start(ServerConfig::default().sensor("thermo")).await;

        let mut subscriber = FeedSubscriber::connect(addr, "thermo", Some("c1")).await.unwrap();
        assert_eq!(subscriber.client_id(), "c1");
        wait_for_clients(&server, "thermo", 1).await;

        let mut publisher = FeedPublisher::connect(addr, "thermo").await.unwrap();
        publisher.send(r#"{"value":21.5}"#).await.unwrap();
        publisher.send(r#"{"value":21.7}"#).await.unwrap();

        assert_eq!(
            subscriber.recv().await.unwrap(),
            Some(Bytes::from_static(br#"{"value":21.5}"#))
        );
        assert_eq!(
            subscriber.recv().await.unwrap(),
            Some(Bytes::from_static(br#"{"value":21.7}"#))
        );

        subscriber.close().await.unwrap();
        wait_for_clients(&server, "thermo", 0).await;
        publisher.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_sensor_rejected() {
        let (_server, addr, _shutdown) = start(ServerConfig::default()).await;

        match FeedPublisher::connect(addr, "ghost").await {
            Err(Error::Rejected(reason)) => assert_eq!(reason, "not found"),
            other => panic!("expected rejection, got {:?}", other.map(|_| ())),
        }
        match FeedSubscriber::connect(addr, "ghost", None).await {
            Err(Error::Rejected(reason)) => assert_eq!(reason, "not found"),
            other => panic!("expected rejection, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_generated_client_id_and_duplicates() {
        let (server, addr, _shutdown) = start(ServerConfig::default().sensor("cam")).await;

        let first = FeedSubscriber::connect(addr, "cam", None).await.unwrap();
        assert!(first.client_id().starts_with("client-"));

        let _named = FeedSubscriber::connect(addr, "cam", Some("viewer")).await.unwrap();
        match FeedSubscriber::connect(addr, "cam", Some("viewer")).await {
            Err(Error::Rejected(reason)) => assert_eq!(reason, "already exists"),
            other => panic!("expected rejection, got {:?}", other.map(|_| ())),
        }

        wait_for_clients(&server, "cam", 2).await;
    }

    #[tokio::test]
    async fn test_subscriber_receives_pings() {
        let config = ServerConfig::default()
            .sensor("thermo")
            .session(SessionConfig::default().keepalive_interval(Duration::from_millis(50)));
        let (server, addr, _shutdown) = start(config).await;

        let mut subscriber = FeedSubscriber::connect(addr, "thermo", None).await.unwrap();
        wait_for_clients(&server, "thermo", 1).await;

        // recv answers pings internally until data arrives
        let registry = Arc::clone(server.registry());
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            registry.publish("thermo", "late").unwrap();
        });

        assert_eq!(
            subscriber.recv().await.unwrap(),
            Some(Bytes::from_static(b"late"))
        );
        assert!(subscriber.pings() >= 2);
    }

    #[tokio::test]
    async fn test_dropped_subscriber_is_unregistered() {
        let (server, addr, _shutdown) = start(ServerConfig::default().sensor("thermo")).await;

        let subscriber = FeedSubscriber::connect(addr, "thermo", Some("c1")).await.unwrap();
        wait_for_clients(&server, "thermo", 1).await;

        drop(subscriber);
        wait_for_clients(&server, "thermo", 0).await;
    }

    #[tokio::test]
    async fn test_shutdown_ends_subscribers() {
        let (server, addr, shutdown) = start(ServerConfig::default().sensor("thermo")).await;

        let mut subscriber = FeedSubscriber::connect(addr, "thermo", None).await.unwrap();
        wait_for_clients(&server, "thermo", 1).await;

        shutdown.send(()).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(2), subscriber.recv())
            .await
            .expect("subscriber should be released on shutdown");
        assert!(matches!(result, Ok(None)));
        assert_eq!(server.registry().sensor_count(), 0);
    }

    #[tokio::test]
    async fn test_bad_handshake() {
        use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

        let (_server, addr, _shutdown) = start(ServerConfig::default()).await;

        let mut socket = TcpStream::connect(addr).await.unwrap();
        socket.write_all(b"HELLO there\n").await.unwrap();

        let mut line = String::new();
        BufReader::new(socket).read_line(&mut line).await.unwrap();
        assert_eq!(line, "ERR bad handshake\n");
    }
}
