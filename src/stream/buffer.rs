//! Bounded lossy buffer
//!
//! A `Stream` holds the most recent `capacity` payloads for a single consumer.
//! Producers never wait: when the buffer is full the oldest payload is evicted
//! to make room for the new one, so the consumer always sees the newest data.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::stats::StreamStats;

use super::subscription::Subscription;

/// Lifecycle state of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Accepting sends and serving receives
    Active,
    /// Closed, but buffered payloads are still waiting to be drained
    Closing,
    /// Closed and empty
    Closed,
}

#[derive(Debug)]
struct Inner {
    queue: VecDeque<Bytes>,
    closed: bool,
}

/// Bounded, drop-oldest buffer of opaque payloads
#[derive(Debug)]
pub struct Stream {
    /// Owning identifier (sensor id or client id)
    id: String,
    /// Maximum number of buffered payloads
    capacity: usize,
    inner: Mutex<Inner>,
    /// Wakes receivers on send and on close
    notify: Notify,
    /// Payloads accepted by `send`
    sent: AtomicU64,
    /// Payloads evicted or coalesced away before being received
    dropped: AtomicU64,
}

impl Stream {
    /// Create a new stream holding at most `capacity` payloads
    ///
    /// A capacity of zero is raised to one.
    pub fn new(id: impl Into<String>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            id: id.into(),
            capacity,
            inner: Mutex::new(Inner {
                queue: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            notify: Notify::new(),
            sent: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Identifier this stream belongs to
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Maximum number of buffered payloads
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Enqueue a payload without blocking
    ///
    /// If the buffer is full, exactly one oldest payload is evicted first.
    /// Returns `false` if the stream is closed, in which case nothing happens.
    pub fn send(&self, payload: Bytes) -> bool {
        {
            let mut inner = self.inner.lock();
            if inner.closed {
                return false;
            }

            if inner.queue.len() >= self.capacity {
                inner.queue.pop_front();
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(stream = %self.id, "Buffer full, evicted oldest payload");
            }

            inner.queue.push_back(payload);
        }

        self.sent.fetch_add(1, Ordering::Relaxed);
        self.notify.notify_waiters();
        true
    }

    /// Drain up to `limit` buffered payloads in FIFO order without waiting
    ///
    /// Returns an empty vector if nothing is queued.
    pub fn poll(&self, limit: usize) -> Vec<Bytes> {
        let mut inner = self.inner.lock();
        let n = limit.min(inner.queue.len());
        inner.queue.drain(..n).collect()
    }

    /// Wait for the next payload
    ///
    /// Returns `None` once the stream is closed and its buffer is drained.
    pub async fn recv(&self) -> Option<Bytes> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register interest before checking so a concurrent send can't be missed
            notified.as_mut().enable();

            {
                let mut inner = self.inner.lock();
                if let Some(payload) = inner.queue.pop_front() {
                    return Some(payload);
                }
                if inner.closed {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Wait for data, then return only the newest payload
    ///
    /// Older buffered payloads are discarded and counted as dropped.
    pub async fn recv_latest(&self) -> Option<Bytes> {
        let first = self.recv().await?;

        let mut inner = self.inner.lock();
        match inner.queue.pop_back() {
            Some(latest) => {
                let skipped = inner.queue.len() as u64 + 1;
                inner.queue.clear();
                self.dropped.fetch_add(skipped, Ordering::Relaxed);
                Some(latest)
            }
            None => Some(first),
        }
    }

    /// Create a receiving cursor over this stream
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        Subscription::new(Arc::clone(self))
    }

    /// Close the stream
    ///
    /// Pending and future receives finish once the buffer is drained, and
    /// later sends become no-ops. Returns `true` only for the call that
    /// performed the transition.
    pub fn close(&self) -> bool {
        let transitioned = {
            let mut inner = self.inner.lock();
            !std::mem::replace(&mut inner.closed, true)
        };

        if transitioned {
            self.notify.notify_waiters();
            tracing::debug!(stream = %self.id, "Stream closed");
        }
        transitioned
    }

    /// Check if the stream has been closed
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Number of payloads currently buffered
    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    /// Check if nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current lifecycle state
    pub fn state(&self) -> StreamState {
        let inner = self.inner.lock();
        match (inner.closed, inner.queue.is_empty()) {
            (false, _) => StreamState::Active,
            (true, false) => StreamState::Closing,
            (true, true) => StreamState::Closed,
        }
    }

    /// Snapshot of this stream's counters
    pub fn stats(&self) -> StreamStats {
        StreamStats {
            id: self.id.clone(),
            capacity: self.capacity,
            buffered: self.len(),
            sent: self.sent.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            state: self.state(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_test::{assert_pending, assert_ready_eq, task};

    use super::*;

    fn payload(s: &'static str) -> Bytes {
        Bytes::from_static(s.as_bytes())
    }

    #[test]
    fn test_drop_oldest() {
        let stream = Stream::new("s", 3);

        for p in ["a", "b", "c", "d"] {
            assert!(stream.send(payload(p)));
        }

        let polled = stream.poll(3);
        assert_eq!(polled, vec![payload("b"), payload("c"), payload("d")]);
        assert_eq!(stream.stats().dropped, 1);
        assert_eq!(stream.stats().sent, 4);
    }

    #[test]
    fn test_poll_returns_last_n_in_order() {
        let stream = Stream::new("s", 5);

        for i in 0..37 {
            stream.send(Bytes::from(format!("msg-{}", i)));
        }

        let polled = stream.poll(5);
        let expected: Vec<Bytes> = (32..37).map(|i| Bytes::from(format!("msg-{}", i))).collect();
        assert_eq!(polled, expected);
    }

    #[test]
    fn test_poll_empty_and_partial() {
        let stream = Stream::new("s", 4);
        assert!(stream.poll(10).is_empty());

        stream.send(payload("a"));
        stream.send(payload("b"));
        stream.send(payload("c"));

        assert_eq!(stream.poll(2), vec![payload("a"), payload("b")]);
        assert_eq!(stream.len(), 1);
        assert_eq!(stream.poll(0), Vec::<Bytes>::new());
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let stream = Stream::new("s", 0);
        assert_eq!(stream.capacity(), 1);

        stream.send(payload("a"));
        stream.send(payload("b"));
        assert_eq!(stream.poll(10), vec![payload("b")]);
    }

    #[test]
    fn test_close_is_idempotent() {
        let stream = Stream::new("s", 2);

        assert!(stream.close());
        assert!(!stream.close());
        assert!(!stream.send(payload("late")));
        assert!(stream.is_empty());
    }

    #[test]
    fn test_state_transitions() {
        let stream = Stream::new("s", 2);
        assert_eq!(stream.state(), StreamState::Active);

        stream.send(payload("a"));
        stream.close();
        assert_eq!(stream.state(), StreamState::Closing);

        stream.poll(1);
        assert_eq!(stream.state(), StreamState::Closed);
    }

    #[tokio::test]
    async fn test_recv_drains_then_ends() {
        let stream = Stream::new("s", 4);
        stream.send(payload("a"));
        stream.send(payload("b"));
        stream.close();

        assert_eq!(stream.recv().await, Some(payload("a")));
        assert_eq!(stream.recv().await, Some(payload("b")));
        assert_eq!(stream.recv().await, None);
    }

    #[test]
    fn test_recv_pending_until_send() {
        let stream = Stream::new("s", 4);
        let mut fut = task::spawn(stream.recv());

        assert_pending!(fut.poll());

        stream.send(payload("x"));
        assert!(fut.is_woken());
        assert_ready_eq!(fut.poll(), Some(payload("x")));
    }

    #[test]
    fn test_recv_wakes_on_close() {
        let stream = Stream::new("s", 4);
        let mut fut = task::spawn(stream.recv());

        assert_pending!(fut.poll());

        stream.close();
        assert!(fut.is_woken());
        assert_ready_eq!(fut.poll(), None);
    }

    #[tokio::test]
    async fn test_recv_latest_coalesces() {
        let stream = Stream::new("s", 10);
        for p in ["a", "b", "c"] {
            stream.send(payload(p));
        }

        assert_eq!(stream.recv_latest().await, Some(payload("c")));
        assert!(stream.is_empty());
        assert_eq!(stream.stats().dropped, 2);
    }

    #[tokio::test]
    async fn test_blocked_recv_returns_after_close() {
        let stream = Arc::new(Stream::new("s", 4));

        let waiter = {
            let stream = Arc::clone(&stream);
            tokio::spawn(async move { stream.recv().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        stream.close();

        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("receiver should finish after close")
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_concurrent_send_and_recv() {
        let stream = Arc::new(Stream::new("s", 8));

        let producer = {
            let stream = Arc::clone(&stream);
            tokio::spawn(async move {
                for i in 0..500u32 {
                    stream.send(Bytes::from(i.to_be_bytes().to_vec()));
                    if i % 50 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
                stream.close();
            })
        };

        let mut last: Option<u32> = None;
        while let Some(p) = stream.recv().await {
            let value = u32::from_be_bytes([p[0], p[1], p[2], p[3]]);
            // Drops are allowed, reordering is not
            if let Some(prev) = last {
                assert!(value > prev);
            }
            last = Some(value);
        }

        producer.await.unwrap();
        assert_eq!(last, Some(499));
    }
}
