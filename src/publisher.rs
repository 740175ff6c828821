// Publish channel: fans rendered payloads out to WebSocket subscribers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

/// Cheap to clone; all clones share the same channel and latest payload.
#[derive(Clone)]
pub struct Publisher {
    tx: broadcast::Sender<Arc<str>>,
    latest: Arc<Mutex<Option<Arc<str>>>>,
    subscribers: Arc<AtomicUsize>,
}

/// A live subscriber. Dropping it decrements the subscriber count.
pub struct Subscription {
    pub rx: broadcast::Receiver<Arc<str>>,
    /// Most recent payload at subscribe time, if any cycle has published yet.
    pub latest: Option<Arc<str>>,
    _guard: SubscriberGuard,
}

/// Decrements the subscriber count on drop (subscribe = +1, drop = -1).
struct SubscriberGuard(Arc<AtomicUsize>);

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

impl Publisher {
    /// `capacity` bounds how many payloads a slow subscriber may fall behind before it skips ahead.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            latest: Arc::new(Mutex::new(None)),
            subscribers: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Stores `payload` as the latest and sends it to every current subscriber.
    /// Never blocks. Returns how many receivers it was queued for.
    pub fn publish(&self, payload: impl Into<Arc<str>>) -> usize {
        let payload = payload.into();
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(payload.clone());
        self.tx.send(payload).unwrap_or(0)
    }

    pub fn subscribe(&self) -> Subscription {
        self.subscribers.fetch_add(1, Ordering::Relaxed);
        let guard = SubscriberGuard(self.subscribers.clone());
        // Receiver first: a publish in between is seen twice rather than missed. Both copies
        // are the same Arc; every payload carries the full store, so a repeat is harmless.
        let rx = self.tx.subscribe();
        let latest = self.latest();
        Subscription {
            rx,
            latest,
            _guard: guard,
        }
    }

    pub fn latest(&self) -> Option<Arc<str>> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.load(Ordering::Relaxed)
    }
}
