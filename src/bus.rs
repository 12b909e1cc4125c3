//! Fan-out channel for progress reports leaving worker threads.

use std::sync::Arc;
use tokio::sync::broadcast;

/// Lossy broadcast of `T` to every current subscriber.
///
/// Messages are shared as `Arc<T>`. With nobody listening they are dropped,
/// and a reader that falls more than `capacity` messages behind gets
/// `RecvError::Lagged` while the publisher carries on.
#[derive(Debug, Clone)]
pub struct Topic<T> {
    tx: broadcast::Sender<Arc<T>>,
}

impl<T: Send + Sync + 'static> Topic<T> {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn has_subscribers(&self) -> bool {
        self.tx.receiver_count() > 0
    }

    /// Returns how many subscribers the message reached.
    pub fn publish(&self, msg: T) -> usize {
        self.tx.send(Arc::new(msg)).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<T>> {
        self.tx.subscribe()
    }
}
