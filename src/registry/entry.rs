//! Per-sensor state stored in the registry

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use parking_lot::RwLock;

use crate::stats::SensorStats;
use crate::stream::Stream;

use super::error::RegistryError;

#[derive(Debug, Default)]
struct Clients {
    streams: HashMap<String, Arc<Stream>>,
    /// Set once the sensor is unregistered; no clients may attach afterwards
    closed: bool,
}

/// Entry for a single sensor in the registry
///
/// Holds the sensor's own history buffer plus one buffer per attached client.
/// Publishing copies the payload into every client buffer while holding the
/// client map's read lock, so each fan-out sees one consistent membership set.
#[derive(Debug)]
pub struct SensorEntry {
    id: String,
    capacity: usize,
    /// Recent history for pollers that are not attached as clients
    base: Arc<Stream>,
    clients: RwLock<Clients>,
    published: AtomicU64,
    created_at: Instant,
}

impl SensorEntry {
    pub(super) fn new(id: &str, capacity: usize) -> Self {
        Self {
            id: id.to_string(),
            capacity,
            base: Arc::new(Stream::new(id, capacity)),
            clients: RwLock::new(Clients::default()),
            published: AtomicU64::new(0),
            created_at: Instant::now(),
        }
    }

    /// Sensor identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The sensor's own history buffer
    pub fn base(&self) -> &Arc<Stream> {
        &self.base
    }

    /// Number of attached clients
    pub fn client_count(&self) -> usize {
        self.clients.read().streams.len()
    }

    /// Get the buffer of an attached client
    pub fn client(&self, client_id: &str) -> Option<Arc<Stream>> {
        self.clients.read().streams.get(client_id).cloned()
    }

    /// Check if the sensor has been torn down
    pub fn is_closed(&self) -> bool {
        self.clients.read().closed
    }

    /// Publish a payload to the base buffer and every attached client
    ///
    /// Returns the number of client buffers that accepted the payload, or
    /// `SensorClosed` if the sensor was torn down.
    pub fn publish(&self, payload: Bytes) -> Result<usize, RegistryError> {
        if !self.base.send(payload.clone()) {
            // Base closes together with the entry
            return Err(RegistryError::SensorClosed(self.id.clone()));
        }
        self.published.fetch_add(1, Ordering::Relaxed);

        let clients = self.clients.read();
        Ok(clients
            .streams
            .values()
            .filter(|stream| stream.send(payload.clone()))
            .count())
    }

    /// Attach a new client buffer
    ///
    /// The client only sees payloads published after it attaches.
    pub(super) fn add_client(&self, client_id: &str) -> Result<Arc<Stream>, RegistryError> {
        let mut clients = self.clients.write();

        if clients.closed {
            return Err(RegistryError::SensorClosed(self.id.clone()));
        }
        if clients.streams.contains_key(client_id) {
            return Err(RegistryError::ClientAlreadyExists {
                sensor: self.id.clone(),
                client: client_id.to_string(),
            });
        }

        let stream = Arc::new(Stream::new(client_id, self.capacity));
        clients
            .streams
            .insert(client_id.to_string(), Arc::clone(&stream));

        tracing::info!(
            sensor = %self.id,
            client = %client_id,
            clients = clients.streams.len(),
            "Client attached"
        );

        Ok(stream)
    }

    /// Detach and close a client buffer
    pub(super) fn remove_client(&self, client_id: &str) -> Result<(), RegistryError> {
        let mut clients = self.clients.write();

        match clients.streams.remove(client_id) {
            Some(stream) => {
                stream.close();
                tracing::info!(
                    sensor = %self.id,
                    client = %client_id,
                    clients = clients.streams.len(),
                    "Client detached"
                );
                Ok(())
            }
            None => Err(RegistryError::ClientNotFound {
                sensor: self.id.clone(),
                client: client_id.to_string(),
            }),
        }
    }

    /// Detach a client only if `stream` is still its registered buffer
    pub(super) fn release_client(&self, client_id: &str, stream: &Arc<Stream>) -> bool {
        let mut clients = self.clients.write();

        let attached = clients
            .streams
            .get(client_id)
            .is_some_and(|current| Arc::ptr_eq(current, stream));
        if attached {
            clients.streams.remove(client_id);
            tracing::info!(
                sensor = %self.id,
                client = %client_id,
                clients = clients.streams.len(),
                "Client released"
            );
        }
        attached
    }

    /// Close the base buffer and every client buffer
    ///
    /// Only the registry calls this, after removing the entry from its map.
    pub(super) fn close(&self) {
        let mut clients = self.clients.write();
        if clients.closed {
            return;
        }
        clients.closed = true;

        for (_, stream) in clients.streams.drain() {
            stream.close();
        }
        self.base.close();
    }

    /// Snapshot of this sensor's statistics
    pub fn stats(&self) -> SensorStats {
        let clients = self.clients.read();
        SensorStats {
            sensor_id: self.id.clone(),
            client_count: clients.streams.len(),
            published: self.published.load(Ordering::Relaxed),
            uptime: self.created_at.elapsed(),
            base: self.base.stats(),
            clients: clients.streams.values().map(|s| s.stats()).collect(),
        }
    }
}
