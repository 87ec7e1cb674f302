//! Stream manager implementation
//!
//! The central registry that maps sensor ids to their entries and routes
//! published payloads to every attached client.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;

use crate::stats::{RegistryStats, SensorStats};
use crate::stream::Stream;

use super::config::RegistryConfig;
use super::entry::SensorEntry;
use super::error::RegistryError;
use super::guard::ClientGuard;

/// Central registry for all sensor streams
///
/// Lookups and publishes take the read lock and may run concurrently;
/// registration and removal take the write lock. Fan-out happens after the
/// map lock is released, on the entry's own client lock.
#[derive(Debug)]
pub struct StreamManager {
    /// Map of sensor id to sensor entry
    sensors: RwLock<HashMap<String, Arc<SensorEntry>>>,

    /// Configuration
    config: RegistryConfig,
}

impl StreamManager {
    /// Create a new manager with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new manager with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            sensors: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a sensor so that payloads can be published to it
    pub fn register(&self, sensor_id: &str) -> Result<(), RegistryError> {
        let mut sensors = self.sensors.write();

        if sensors.contains_key(sensor_id) {
            return Err(RegistryError::SensorAlreadyExists(sensor_id.to_string()));
        }

        let entry = SensorEntry::new(sensor_id, self.config.stream_capacity);
        sensors.insert(sensor_id.to_string(), Arc::new(entry));

        tracing::info!(
            sensor = %sensor_id,
            capacity = self.config.stream_capacity,
            sensors = sensors.len(),
            "Sensor registered"
        );
        Ok(())
    }

    /// Register many sensors at once, skipping ids that already exist
    ///
    /// Returns the number of sensors newly registered.
    pub fn register_sensors<I, S>(&self, sensor_ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        sensor_ids
            .into_iter()
            .filter(|id| match self.register(id.as_ref()) {
                Ok(()) => true,
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping sensor registration");
                    false
                }
            })
            .count()
    }

    /// Remove a sensor and close all of its streams
    ///
    /// Removing an unknown or already removed sensor is a no-op that returns
    /// `SensorNotFound`.
    pub fn unregister(&self, sensor_id: &str) -> Result<(), RegistryError> {
        let removed = self.sensors.write().remove(sensor_id);

        match removed {
            Some(entry) => {
                let clients = entry.client_count();
                entry.close();
                tracing::info!(sensor = %sensor_id, clients = clients, "Sensor unregistered");
                Ok(())
            }
            None => {
                tracing::warn!(sensor = %sensor_id, "Unregister for unknown sensor");
                Err(RegistryError::SensorNotFound(sensor_id.to_string()))
            }
        }
    }

    /// Publish a payload to a sensor
    ///
    /// Returns the number of clients the payload was delivered to. A publish
    /// that races with [`unregister`](Self::unregister) fails with
    /// `SensorClosed` rather than reporting zero clients.
    pub fn publish(&self, sensor_id: &str, payload: impl Into<Bytes>) -> Result<usize, RegistryError> {
        let entry = self
            .lookup(sensor_id)
            .ok_or_else(|| RegistryError::SensorNotFound(sensor_id.to_string()))?;

        entry.publish(payload.into())
    }

    /// Look up a sensor entry
    pub fn lookup(&self, sensor_id: &str) -> Option<Arc<SensorEntry>> {
        self.sensors.read().get(sensor_id).cloned()
    }

    /// Check if a sensor is registered
    pub fn contains(&self, sensor_id: &str) -> bool {
        self.sensors.read().contains_key(sensor_id)
    }

    /// Attach a client to a sensor and return its buffer
    ///
    /// The caller must call [`unregister_client`](Self::unregister_client)
    /// exactly once when the client goes away. Prefer
    /// [`attach_client`](Self::attach_client), which does that on drop.
    pub fn register_client(
        &self,
        sensor_id: &str,
        client_id: &str,
    ) -> Result<Arc<Stream>, RegistryError> {
        let entry = self
            .lookup(sensor_id)
            .ok_or_else(|| RegistryError::SensorNotFound(sensor_id.to_string()))?;

        entry.add_client(client_id)
    }

    /// Detach a client from a sensor and close its buffer
    pub fn unregister_client(&self, sensor_id: &str, client_id: &str) -> Result<(), RegistryError> {
        let entry = self
            .lookup(sensor_id)
            .ok_or_else(|| RegistryError::SensorNotFound(sensor_id.to_string()))?;

        entry.remove_client(client_id)
    }

    /// Attach a client whose registration is released when the guard drops
    pub fn attach_client(
        self: &Arc<Self>,
        sensor_id: &str,
        client_id: &str,
    ) -> Result<ClientGuard, RegistryError> {
        let stream = self.register_client(sensor_id, client_id)?;
        Ok(ClientGuard::new(Arc::clone(self), sensor_id, client_id, stream))
    }

    /// Detach a client only if it still owns `stream`
    ///
    /// Guards use this so that a stale guard never detaches a newer client
    /// that reused the same id after its sensor was re-registered.
    pub(super) fn release_client(
        &self,
        sensor_id: &str,
        client_id: &str,
        stream: &Arc<Stream>,
    ) -> bool {
        self.lookup(sensor_id)
            .is_some_and(|entry| entry.release_client(client_id, stream))
    }

    /// Ids of all registered sensors
    pub fn sensor_ids(&self) -> Vec<String> {
        self.sensors.read().keys().cloned().collect()
    }

    /// Get total number of sensors
    pub fn sensor_count(&self) -> usize {
        self.sensors.read().len()
    }

    /// Get statistics for one sensor
    pub fn sensor_stats(&self, sensor_id: &str) -> Option<SensorStats> {
        self.lookup(sensor_id).map(|entry| entry.stats())
    }

    /// Get registry-wide statistics
    pub fn stats(&self) -> RegistryStats {
        let sensors = self.sensors.read();
        sensors.values().fold(
            RegistryStats {
                sensors: sensors.len(),
                ..Default::default()
            },
            |mut acc, entry| {
                let stats = entry.stats();
                acc.clients += stats.client_count;
                acc.published += stats.published;
                acc
            },
        )
    }

    /// Remove every sensor, closing all streams
    pub fn shutdown(&self) {
        let drained: Vec<_> = self.sensors.write().drain().collect();
        for (_, entry) in &drained {
            entry.close();
        }
        tracing::info!(sensors = drained.len(), "Stream manager shut down");
    }
}

impl Default for StreamManager {
    fn default() -> Self {
        Self::new()
    }
}
