//! Periodic latest-reading sampler
//!
//! A [`ReadingMonitor`] attaches an internal client to a sensor and, once per
//! interval, hands the newest payload that arrived since the previous tick to
//! a [`LatestReadingSink`]. Anything older is discarded. Intervals with no new
//! data are skipped. The monitor ends when the sensor is unregistered.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::registry::{RegistryError, StreamManager};

/// Client id used by the monitor when attaching to a sensor
pub const MONITOR_CLIENT_ID: &str = "__monitor__";

/// Shortest sampling interval a monitor will use
pub const MIN_SAMPLE_INTERVAL: Duration = Duration::from_millis(1);

/// Receiver of sampled readings (e.g. a persistence layer)
pub trait LatestReadingSink: Send + Sync + 'static {
    /// Store the latest reading of a sensor
    fn store_latest(&self, sensor_id: &str, payload: Bytes) -> impl Future<Output = ()> + Send;
}

/// Samples the newest payload of one sensor at a fixed interval
pub struct ReadingMonitor<S: LatestReadingSink> {
    manager: Arc<StreamManager>,
    sink: Arc<S>,
    interval: Duration,
}

impl<S: LatestReadingSink> ReadingMonitor<S> {
    /// Create a monitor sampling every `interval`
    ///
    /// The interval is raised to at least [`MIN_SAMPLE_INTERVAL`].
    pub fn new(manager: Arc<StreamManager>, sink: Arc<S>, interval: Duration) -> Self {
        Self {
            manager,
            sink,
            interval: interval.max(MIN_SAMPLE_INTERVAL),
        }
    }

    /// Attach to `sensor_id` and start sampling on a background task
    ///
    /// Fails if the sensor is unknown or already monitored.
    pub fn spawn(&self, sensor_id: &str) -> Result<JoinHandle<u64>, RegistryError> {
        let guard = self.manager.attach_client(sensor_id, MONITOR_CLIENT_ID)?;
        let sink = Arc::clone(&self.sink);
        let period = self.interval;

        Ok(tokio::spawn(async move {
            let stream = Arc::clone(guard.stream());
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut stored = 0u64;

            loop {
                ticker.tick().await;

                let backlog = stream.poll(stream.capacity());
                if let Some(latest) = backlog.into_iter().last() {
                    sink.store_latest(guard.sensor_id(), latest).await;
                    stored += 1;
                } else if stream.is_closed() {
                    break;
                } else {
                    tracing::trace!(sensor = %guard.sensor_id(), "No new readings");
                }
            }

            tracing::debug!(sensor = %guard.sensor_id(), stored = stored, "Reading monitor stopped");
            stored
        }))
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    #[derive(Default)]
    struct MemorySink {
        stored: Mutex<Vec<(String, Bytes)>>,
    }

    impl LatestReadingSink for MemorySink {
        async fn store_latest(&self, sensor_id: &str, payload: Bytes) {
            self.stored.lock().push((sensor_id.to_string(), payload));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_samples_latest_per_interval() {
        let manager = Arc::new(StreamManager::new());
        manager.register("thermo").unwrap();
        let sink = Arc::new(MemorySink::default());
        let monitor = ReadingMonitor::new(Arc::clone(&manager), Arc::clone(&sink), Duration::from_secs(10));

        let handle = monitor.spawn("thermo").unwrap();
        // Let the immediate first tick pass with nothing buffered
        tokio::task::yield_now().await;

        manager.publish("thermo", "20.1").unwrap();
        manager.publish("thermo", "20.4").unwrap();
        tokio::time::sleep(Duration::from_secs(11)).await;

        // Quiet interval
        tokio::time::sleep(Duration::from_secs(10)).await;

        manager.publish("thermo", "21.0").unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;

        manager.unregister("thermo").unwrap();
        let stored = handle.await.unwrap();

        assert_eq!(stored, 2);
        let readings = sink.stored.lock().clone();
        assert_eq!(
            readings,
            vec![
                ("thermo".to_string(), Bytes::from_static(b"20.4")),
                ("thermo".to_string(), Bytes::from_static(b"21.0")),
            ]
        );
    }

    #[tokio::test]
    async fn test_spawn_errors() {
        let manager = Arc::new(StreamManager::new());
        let sink = Arc::new(MemorySink::default());
        let monitor = ReadingMonitor::new(Arc::clone(&manager), sink, Duration::from_secs(1));

        assert!(monitor.spawn("missing").unwrap_err().is_not_found());

        manager.register("thermo").unwrap();
        let _handle = monitor.spawn("thermo").unwrap();
        assert!(monitor.spawn("thermo").unwrap_err().is_already_exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_clamped() {
        let manager = Arc::new(StreamManager::new());
        manager.register("thermo").unwrap();
        let sink = Arc::new(MemorySink::default());
        let monitor = ReadingMonitor::new(Arc::clone(&manager), Arc::clone(&sink), Duration::ZERO);

        let handle = monitor.spawn("thermo").unwrap();
        manager.publish("thermo", "19.8").unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        manager.unregister("thermo").unwrap();
        assert_eq!(handle.await.unwrap(), 1);
        assert_eq!(sink.stored.lock().len(), 1);
    }
}
