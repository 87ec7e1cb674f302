//! Subscriber worker
//!
//! Drains one client's stream into a [`FrameSink`] at the sink's own pace,
//! interleaving keepalive probes so idle connections stay visibly alive.
//! The client registration is released on every exit path because the
//! session owns the [`ClientGuard`].

use bytes::Bytes;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};

use crate::error::Error;
use crate::protocol::ProtocolError;
use crate::registry::ClientGuard;
use crate::stream::Subscription;

use super::config::{SessionConfig, MIN_KEEPALIVE_INTERVAL};
use super::context::SessionContext;
use super::summary::{EndReason, SessionSummary};
use super::transport::FrameSink;

/// Worker that serves one subscriber connection
#[derive(Debug)]
pub struct SubscriberSession {
    ctx: SessionContext,
    guard: ClientGuard,
    config: SessionConfig,
}

async fn next_payload(sub: &mut Subscription, coalesce: bool) -> Option<Bytes> {
    if coalesce {
        sub.next_latest().await
    } else {
        sub.next().await
    }
}

impl SubscriberSession {
    /// Create a session for an attached client
    pub fn new(ctx: SessionContext, guard: ClientGuard, config: SessionConfig) -> Self {
        Self { ctx, guard, config }
    }

    /// Session context
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Run until the stream closes or the sink fails
    ///
    /// If the returned future is dropped early, the client is still
    /// unregistered when the session is dropped with it.
    pub async fn run<K: FrameSink>(self, sink: &mut K) -> SessionSummary {
        let SubscriberSession { ctx, guard, config } = self;
        let mut sub = guard.subscribe();

        // The field is public, so the builder clamp can be bypassed
        let period = config.keepalive_interval.max(MIN_KEEPALIVE_INTERVAL);
        let mut keepalive = interval_at(Instant::now() + period, period);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut delivered = 0u64;
        let mut pings = 0u64;
        let mut skipped = 0u64;

        tracing::debug!(
            session_id = ctx.session_id,
            sensor = %ctx.sensor_id,
            client = %guard.client_id(),
            "Subscriber session started"
        );

        let reason = loop {
            tokio::select! {
                next = next_payload(&mut sub, config.coalesce) => {
                    let Some(payload) = next else {
                        break EndReason::StreamClosed;
                    };
                    let size = payload.len();
                    match timeout(config.write_timeout, sink.send_data(payload)).await {
                        Ok(Ok(())) => delivered += 1,
                        Ok(Err(Error::Protocol(ProtocolError::FrameTooLarge(_)))) => {
                            skipped += 1;
                            tracing::warn!(
                                session_id = ctx.session_id,
                                sensor = %ctx.sensor_id,
                                size = size,
                                "Skipping payload too large for transport"
                            );
                        }
                        Ok(Err(e)) => break EndReason::WriteFailed(e.to_string()),
                        Err(_) => break EndReason::Timeout,
                    }
                }
                _ = keepalive.tick() => {
                    match timeout(config.write_timeout, sink.send_ping()).await {
                        Ok(Ok(())) => pings += 1,
                        Ok(Err(e)) => break EndReason::WriteFailed(e.to_string()),
                        Err(_) => break EndReason::Timeout,
                    }
                }
            }
        };

        if reason == EndReason::StreamClosed {
            // Best effort; the peer may already be gone
            let _ = timeout(config.write_timeout, sink.close()).await;
        }

        let client_id = guard.client_id().to_string();
        drop(guard);

        let summary = SessionSummary {
            delivered,
            pings,
            skipped,
            duration: ctx.elapsed(),
            ..SessionSummary::new(reason)
        };

        tracing::info!(
            session_id = ctx.session_id,
            sensor = %ctx.sensor_id,
            client = %client_id,
            delivered = summary.delivered,
            pings = summary.pings,
            skipped = summary.skipped,
            reason = %summary.reason,
            "Subscriber session ended"
        );

        summary
    }
}
