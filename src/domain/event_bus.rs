//! Broadcast channel for scene-change notifications.
//!
//! [`SceneEventBus`] wraps a [`tokio::sync::broadcast`] channel. Every
//! scene mutation publishes a [`SceneEvent`]; each session holds a
//! [`SceneSubscription`] for as long as it lives.

use tokio::sync::broadcast;

use super::SceneEvent;

/// Broadcast bus for [`SceneEvent`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity.
/// When the ring buffer is full, the oldest events are dropped for lagging
/// receivers, which then see [`broadcast::error::RecvError::Lagged`].
#[derive(Debug, Clone)]
pub struct SceneEventBus {
    sender: broadcast::Sender<SceneEvent>,
}

impl SceneEventBus {
    /// Creates a new bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event.
    /// If there are no active receivers, the event is silently dropped.
    pub fn publish(&self, event: SceneEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribes to all future events.
    ///
    /// The subscription is released when the returned handle is dropped.
    #[must_use]
    pub fn subscribe(&self) -> SceneSubscription {
        SceneSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Returns the current number of live subscriptions.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Scoped subscription to scene-change notifications.
///
/// Dropping it unsubscribes, so every exit path of the owner releases it.
#[derive(Debug)]
pub struct SceneSubscription {
    receiver: broadcast::Receiver<SceneEvent>,
}

impl SceneSubscription {
    /// Waits for the next event.
    ///
    /// # Errors
    ///
    /// Returns [`broadcast::error::RecvError::Lagged`] when events were
    /// dropped for this subscriber, and
    /// [`broadcast::error::RecvError::Closed`] once the bus is gone.
    pub async fn recv(&mut self) -> Result<SceneEvent, broadcast::error::RecvError> {
        self.receiver.recv().await
    }
}
