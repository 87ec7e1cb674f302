//! Registry error types
//!
//! Error types for stream registry operations.

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Sensor id is already registered
    SensorAlreadyExists(String),
    /// Sensor id is not registered
    SensorNotFound(String),
    /// Client id is already attached to the sensor
    ClientAlreadyExists { sensor: String, client: String },
    /// Client id is not attached to the sensor
    ClientNotFound { sensor: String, client: String },
    /// Sensor is being torn down and accepts no new clients
    SensorClosed(String),
}

impl RegistryError {
    /// `register` or `register_client` was called for an id already present
    pub fn is_already_exists(&self) -> bool {
        matches!(
            self,
            RegistryError::SensorAlreadyExists(_) | RegistryError::ClientAlreadyExists { .. }
        )
    }

    /// The operation targeted an unknown sensor or client
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RegistryError::SensorNotFound(_) | RegistryError::ClientNotFound { .. }
        )
    }

    /// The operation raced with teardown
    pub fn is_closed(&self) -> bool {
        matches!(self, RegistryError::SensorClosed(_))
    }
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::SensorAlreadyExists(id) => write!(f, "Sensor already exists: {}", id),
            RegistryError::SensorNotFound(id) => write!(f, "Sensor not found: {}", id),
            RegistryError::ClientAlreadyExists { sensor, client } => {
                write!(f, "Client {} already attached to sensor {}", client, sensor)
            }
            RegistryError::ClientNotFound { sensor, client } => {
                write!(f, "Client {} not attached to sensor {}", client, sensor)
            }
            RegistryError::SensorClosed(id) => write!(f, "Sensor closed: {}", id),
        }
    }
}

impl std::error::Error for RegistryError {}
