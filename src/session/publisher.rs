//! Publisher worker
//!
//! Reads payloads from a [`FrameSource`] and publishes them to one sensor.
//! The session ends when the peer goes away, stays silent longer than the
//! read timeout, or the sensor is unregistered underneath it.

use std::sync::Arc;

use tokio::time::timeout;

use crate::registry::StreamManager;

use super::config::SessionConfig;
use super::context::SessionContext;
use super::summary::{EndReason, SessionSummary};
use super::transport::{FrameSource, Inbound};

/// Worker that serves one publisher connection
#[derive(Debug)]
pub struct PublisherSession {
    ctx: SessionContext,
    manager: Arc<StreamManager>,
    config: SessionConfig,
}

impl PublisherSession {
    /// Create a session publishing to `ctx.sensor_id`
    pub fn new(ctx: SessionContext, manager: Arc<StreamManager>, config: SessionConfig) -> Self {
        Self {
            ctx,
            manager,
            config,
        }
    }

    /// Session context
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Run until the source ends or publishing fails
    pub async fn run<S: FrameSource>(self, source: &mut S) -> SessionSummary {
        let sensor_id = self.ctx.sensor_id.as_str();
        let mut published = 0u64;

        tracing::debug!(
            session_id = self.ctx.session_id,
            sensor = %sensor_id,
            "Publisher session started"
        );

        let reason = loop {
            match timeout(self.config.read_timeout, source.next_inbound()).await {
                Ok(Ok(Inbound::Payload(payload))) => {
                    match self.manager.publish(sensor_id, payload) {
                        Ok(_) => published += 1,
                        Err(e) => break EndReason::Rejected(e),
                    }
                }
                Ok(Ok(Inbound::Keepalive)) => continue,
                Ok(Ok(Inbound::Closed)) => break EndReason::PeerClosed,
                Ok(Err(e)) => break EndReason::ReadFailed(e.to_string()),
                Err(_) => break EndReason::Timeout,
            }
        };

        let summary = SessionSummary {
            published,
            duration: self.ctx.elapsed(),
            ..SessionSummary::new(reason)
        };

        tracing::info!(
            session_id = self.ctx.session_id,
            sensor = %sensor_id,
            published = summary.published,
            reason = %summary.reason,
            "Publisher session ended"
        );

        summary
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::time::Duration;

    use bytes::Bytes;

    use super::*;
    use crate::error::{Error, Result};
    use crate::registry::RegistryError;
    use crate::session::SessionRole;

    /// Source that replays a script, then either ends or stalls
    struct ScriptedSource {
        script: VecDeque<Result<Inbound>>,
        stall_when_empty: bool,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Inbound>>, stall_when_empty: bool) -> Self {
            Self {
                script: script.into(),
                stall_when_empty,
            }
        }
    }

    impl FrameSource for ScriptedSource {
        async fn next_inbound(&mut self) -> Result<Inbound> {
            match self.script.pop_front() {
                Some(item) => item,
                None if self.stall_when_empty => std::future::pending().await,
                None => Ok(Inbound::Closed),
            }
        }
    }

    fn payload(s: &'static str) -> Result<Inbound> {
        Ok(Inbound::Payload(Bytes::from_static(s.as_bytes())))
    }

    fn session(manager: &Arc<StreamManager>, config: SessionConfig) -> PublisherSession {
        let ctx = SessionContext::new(1, "s1", SessionRole::Publisher);
        PublisherSession::new(ctx, Arc::clone(manager), config)
    }

    #[tokio::test]
    async fn test_publishes_until_closed() {
        let manager = Arc::new(StreamManager::new());
        manager.register("s1").unwrap();
        let client = manager.register_client("s1", "c1").unwrap();

        let mut source = ScriptedSource::new(
            vec![payload("1"), Ok(Inbound::Keepalive), payload("2")],
            false,
        );
        let summary = session(&manager, SessionConfig::default()).run(&mut source).await;

        assert_eq!(summary.reason, EndReason::PeerClosed);
        assert_eq!(summary.published, 2);
        assert_eq!(
            client.poll(10),
            vec![Bytes::from_static(b"1"), Bytes::from_static(b"2")]
        );
    }

    #[tokio::test]
    async fn test_unknown_sensor_is_rejected() {
        let manager = Arc::new(StreamManager::new());

        let mut source = ScriptedSource::new(vec![payload("1")], false);
        let summary = session(&manager, SessionConfig::default()).run(&mut source).await;

        assert_eq!(
            summary.reason,
            EndReason::Rejected(RegistryError::SensorNotFound("s1".into()))
        );
        assert_eq!(summary.published, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_timeout() {
        let manager = Arc::new(StreamManager::new());
        manager.register("s1").unwrap();

        let config = SessionConfig::default().read_timeout(Duration::from_secs(10));
        let mut source = ScriptedSource::new(vec![payload("1")], true);
        let summary = session(&manager, config).run(&mut source).await;

        assert_eq!(summary.reason, EndReason::Timeout);
        assert_eq!(summary.published, 1);
    }

    #[tokio::test]
    async fn test_read_error() {
        let manager = Arc::new(StreamManager::new());
        manager.register("s1").unwrap();

        let mut source = ScriptedSource::new(vec![Err(Error::ConnectionClosed)], false);
        let summary = session(&manager, SessionConfig::default()).run(&mut source).await;

        assert!(matches!(summary.reason, EndReason::ReadFailed(_)));
    }
}
