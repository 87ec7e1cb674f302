//! Statistics snapshots for streams and sensors

use std::time::Duration;

use crate::stream::StreamState;

/// Counters for a single stream
#[derive(Debug, Clone)]
pub struct StreamStats {
    /// Owning identifier
    pub id: String,
    /// Maximum number of buffered payloads
    pub capacity: usize,
    /// Payloads currently buffered
    pub buffered: usize,
    /// Payloads accepted by `send`
    pub sent: u64,
    /// Payloads evicted or coalesced before being received
    pub dropped: u64,
    /// Current lifecycle state
    pub state: StreamState,
}

impl StreamStats {
    /// Fraction of sent payloads that were dropped, as a percentage
    pub fn drop_rate(&self) -> f64 {
        if self.sent > 0 {
            (self.dropped as f64 / self.sent as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Buffer fill level as a percentage
    pub fn utilization(&self) -> f32 {
        if self.capacity > 0 {
            (self.buffered as f32 / self.capacity as f32) * 100.0
        } else {
            0.0
        }
    }
}

/// Statistics for one registered sensor
#[derive(Debug, Clone)]
pub struct SensorStats {
    /// Sensor identifier
    pub sensor_id: String,
    /// Number of attached clients
    pub client_count: usize,
    /// Payloads published to this sensor
    pub published: u64,
    /// Time since the sensor was registered
    pub uptime: Duration,
    /// The sensor's own history buffer
    pub base: StreamStats,
    /// Per-client buffers
    pub clients: Vec<StreamStats>,
}

impl SensorStats {
    /// Published payloads per second since registration
    pub fn publish_rate(&self) -> f64 {
        let secs = self.uptime.as_secs_f64();
        if secs > 0.0 {
            self.published as f64 / secs
        } else {
            0.0
        }
    }

    /// Total payloads dropped across all client buffers
    pub fn client_drops(&self) -> u64 {
        self.clients.iter().map(|c| c.dropped).sum()
    }
}

/// Registry-wide statistics
#[derive(Debug, Clone, Default)]
pub struct RegistryStats {
    /// Registered sensors
    pub sensors: usize,
    /// Attached clients across all sensors
    pub clients: usize,
    /// Payloads published across all sensors
    pub published: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_stats(sent: u64, dropped: u64, buffered: usize) -> StreamStats {
        StreamStats {
            id: "s".to_string(),
            capacity: 10,
            buffered,
            sent,
            dropped,
            state: StreamState::Active,
        }
    }

    #[test]
    fn test_drop_rate() {
        assert_eq!(stream_stats(0, 0, 0).drop_rate(), 0.0);
        assert!((stream_stats(200, 50, 0).drop_rate() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_utilization() {
        assert_eq!(stream_stats(0, 0, 0).utilization(), 0.0);
        assert!((stream_stats(5, 0, 5).utilization() - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_sensor_stats_aggregates() {
        let stats = SensorStats {
            sensor_id: "thermo".to_string(),
            client_count: 2,
            published: 100,
            uptime: Duration::from_secs(10),
            base: stream_stats(100, 90, 10),
            clients: vec![stream_stats(100, 3, 1), stream_stats(80, 4, 2)],
        };

        assert_eq!(stats.client_drops(), 7);
        assert!((stats.publish_rate() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_publish_rate_zero_uptime() {
        let stats = SensorStats {
            sensor_id: "x".to_string(),
            client_count: 0,
            published: 5,
            uptime: Duration::ZERO,
            base: stream_stats(5, 0, 5),
            clients: Vec::new(),
        };
        assert_eq!(stats.publish_rate(), 0.0);
    }
}
