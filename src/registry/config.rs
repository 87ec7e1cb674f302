//! Registry configuration

/// Default number of payloads buffered per stream
pub const DEFAULT_STREAM_CAPACITY: usize = 100;

/// Configuration for the stream registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Capacity of every stream the registry creates (sensor and client)
    pub stream_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            stream_capacity: DEFAULT_STREAM_CAPACITY,
        }
    }
}

impl RegistryConfig {
    /// Set the per-stream capacity (minimum 1)
    pub fn stream_capacity(mut self, capacity: usize) -> Self {
        self.stream_capacity = capacity.max(1);
        self
    }
}
