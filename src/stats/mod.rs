//! Statistics for streams, sensors and the registry

pub mod metrics;

pub use metrics::{RegistryStats, SensorStats, StreamStats};
