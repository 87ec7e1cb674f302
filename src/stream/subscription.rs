//! Per-connection receive cursor

use std::sync::Arc;

use bytes::Bytes;

use super::buffer::Stream;

/// Lazy sequence of payloads from one stream
///
/// Each connection creates its own subscription. The sequence ends when the
/// underlying stream is closed and drained.
#[derive(Debug, Clone)]
pub struct Subscription {
    stream: Arc<Stream>,
}

impl Subscription {
    pub(super) fn new(stream: Arc<Stream>) -> Self {
        Self { stream }
    }

    /// Wait for the next payload in FIFO order
    pub async fn next(&mut self) -> Option<Bytes> {
        self.stream.recv().await
    }

    /// Wait for data and skip straight to the newest payload
    pub async fn next_latest(&mut self) -> Option<Bytes> {
        self.stream.recv_latest().await
    }

    /// The stream this subscription reads from
    pub fn stream(&self) -> &Arc<Stream> {
        &self.stream
    }

    /// Check if the sequence has ended
    pub fn is_finished(&self) -> bool {
        self.stream.is_closed() && self.stream.is_empty()
    }
}
