//! Fan-out of "object clicked" notifications to every interested session.
//!
//! [`ClickHub`] decouples the input layer (which detects clicks) from the
//! session layer (which forwards them to clients). It is an explicit
//! instance owned by the server and handed to each session, not a global.
//!
//! The subscriber list is copy-on-write: `register`/`unregister` swap in a
//! new list under a short write lock, while `publish` clones the current
//! list pointer and iterates it with no lock held. A publish that started
//! before an `unregister` may therefore still call the removed callback,
//! which must check its own liveness.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use super::ObjectId;

/// Failure reported by a click subscriber.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("click subscriber failed: {0}")]
pub struct SubscriberError(pub String);

/// Callback invoked with the id of each clicked object.
pub type ClickCallback = Arc<dyn Fn(&ObjectId) -> Result<(), SubscriberError> + Send + Sync>;

/// Handle identifying one registration, used to unregister it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Clone)]
struct Subscriber {
    id: SubscriptionId,
    callback: ClickCallback,
}

struct ClickHubInner {
    subscribers: RwLock<Arc<Vec<Subscriber>>>,
    next_id: AtomicU64,
}

/// Multi-subscriber click notification hub.
///
/// Cheap to clone; clones share the same subscriber list.
#[derive(Clone)]
pub struct ClickHub {
    inner: Arc<ClickHubInner>,
}

impl ClickHub {
    /// Creates a hub with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ClickHubInner {
                subscribers: RwLock::new(Arc::new(Vec::new())),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Adds a subscriber. Never fails.
    pub fn register(&self, callback: ClickCallback) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let mut guard = self.inner.subscribers.write();
        let mut next = Vec::with_capacity(guard.len().saturating_add(1));
        next.extend(guard.iter().cloned());
        next.push(Subscriber { id, callback });
        *guard = Arc::new(next);
        id
    }

    /// Removes a subscriber. No-op if it is not registered.
    pub fn unregister(&self, id: SubscriptionId) {
        let mut guard = self.inner.subscribers.write();
        if !guard.iter().any(|s| s.id == id) {
            return;
        }
        let next: Vec<Subscriber> = guard.iter().filter(|s| s.id != id).cloned().collect();
        *guard = Arc::new(next);
    }

    /// Invokes every current subscriber with `object_id`.
    ///
    /// A subscriber that returns an error or panics is logged and skipped;
    /// the remaining subscribers are still called. Returns the number of
    /// subscribers that accepted the notification.
    pub fn publish(&self, object_id: &ObjectId) -> usize {
        let subscribers = Arc::clone(&*self.inner.subscribers.read());
        let mut delivered = 0usize;
        for subscriber in subscribers.iter() {
            match catch_unwind(AssertUnwindSafe(|| (subscriber.callback)(object_id))) {
                Ok(Ok(())) => delivered = delivered.saturating_add(1),
                Ok(Err(err)) => {
                    tracing::warn!(%object_id, subscription = subscriber.id.0, error = %err, "click subscriber failed");
                }
                Err(_) => {
                    tracing::error!(%object_id, subscription = subscriber.id.0, "click subscriber panicked");
                }
            }
        }
        delivered
    }

    /// Returns the number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }
}

impl Default for ClickHub {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ClickHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClickHub")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
