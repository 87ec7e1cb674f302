//! Scoped client registration

use std::sync::Arc;

use crate::stream::{Stream, Subscription};

use super::store::StreamManager;

/// A client registration that is released when dropped
///
/// Holding the guard keeps the client attached to its sensor. Dropping it
/// (on normal return, early `?` return, or unwind) detaches the client
/// exactly once. If the sensor was already torn down, the drop is a no-op.
#[derive(Debug)]
pub struct ClientGuard {
    manager: Arc<StreamManager>,
    sensor_id: String,
    client_id: String,
    stream: Arc<Stream>,
}

impl ClientGuard {
    pub(super) fn new(
        manager: Arc<StreamManager>,
        sensor_id: &str,
        client_id: &str,
        stream: Arc<Stream>,
    ) -> Self {
        Self {
            manager,
            sensor_id: sensor_id.to_string(),
            client_id: client_id.to_string(),
            stream,
        }
    }

    /// Sensor this client is attached to
    pub fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    /// Client identifier
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The client's buffer
    pub fn stream(&self) -> &Arc<Stream> {
        &self.stream
    }

    /// Create a receiving cursor over the client's buffer
    pub fn subscribe(&self) -> Subscription {
        self.stream.subscribe()
    }
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        // Sensor teardown may already have closed and removed this client
        if !self
            .manager
            .release_client(&self.sensor_id, &self.client_id, &self.stream)
        {
            tracing::debug!(
                sensor = %self.sensor_id,
                client = %self.client_id,
                "Client already detached"
            );
        }
        self.stream.close();
    }
}
