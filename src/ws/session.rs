//! Per-connection session state machine.
//!
//! ```text
//! Connecting ──open()──▶ OpenNotReady ──client_ready──▶ OpenReady
//!      │                      │                            │
//!      └──────────────────────┴────────close()─────────────┴──▶ Closed
//! ```
//!
//! [`Session`] knows nothing about the transport. Each handler returns the
//! messages to push, and the connection loop sends them in order. Snapshot
//! pushes are gated by readiness; click notifications are not.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use super::messages::{InboundAction, OutboundMessage};
use crate::domain::{
    ClickCallback, ObjectId, SceneEvent, SceneSubscription, SessionId, SubscriberError,
    SubscriptionId,
};
use crate::service::SceneService;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, not yet subscribed.
    Connecting,
    /// Subscribed; waiting for `client_ready`.
    OpenNotReady,
    /// Pushing snapshots.
    OpenReady,
    /// Terminal.
    Closed,
}

/// Flags shared between a session, its click callback and the registry.
#[derive(Debug, Clone, Default)]
pub struct SessionFlags {
    open: Arc<AtomicBool>,
    ready: Arc<AtomicBool>,
}

impl SessionFlags {
    /// Returns `true` while the session may still send.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Returns `true` once the client signalled readiness.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}

/// Receivers the connection loop polls on behalf of an open session.
///
/// Dropping `scene` releases the scene-change subscription.
#[derive(Debug)]
pub struct SessionChannels {
    /// Scene-change notifications.
    pub scene: SceneSubscription,
    /// Clicks forwarded by the hub callback.
    pub clicks: mpsc::UnboundedReceiver<ObjectId>,
}

/// One client conversation.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    state: SessionState,
    service: Arc<SceneService>,
    flags: SessionFlags,
    click_subscription: Option<SubscriptionId>,
}

impl Session {
    /// Creates a session in the [`SessionState::Connecting`] state.
    #[must_use]
    pub fn new(id: SessionId, service: Arc<SceneService>) -> Self {
        Self {
            id,
            state: SessionState::Connecting,
            service,
            flags: SessionFlags::default(),
            click_subscription: None,
        }
    }

    /// Session identifier.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns `true` once `client_ready` was received. Never reverts, not
    /// even on close; sends are gated by [`Session::is_open`].
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.flags.is_ready()
    }

    /// Returns `true` unless the session is closed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(
            self.state,
            SessionState::OpenNotReady | SessionState::OpenReady
        )
    }

    /// Shared flags, for the registry.
    #[must_use]
    pub fn flags(&self) -> SessionFlags {
        self.flags.clone()
    }

    /// Accepts the connection: subscribes to scene changes and registers a
    /// click callback on the hub.
    ///
    /// The callback only enqueues, so a publish never waits on the
    /// transport. Once the session is closed the callback does nothing.
    pub fn open(&mut self) -> SessionChannels {
        let scene = self.service.subscribe();
        let (tx, clicks) = mpsc::unbounded_channel();

        if let Some(previous) = self.click_subscription.take() {
            self.service.hub().unregister(previous);
        }
        let open = Arc::clone(&self.flags.open);
        let callback: ClickCallback = Arc::new(move |object_id: &ObjectId| {
            if !open.load(Ordering::Acquire) {
                return Ok(());
            }
            tx.send(object_id.clone())
                .map_err(|_| SubscriberError("session click queue closed".to_string()))
        });
        self.click_subscription = Some(self.service.hub().register(callback));

        self.flags.open.store(true, Ordering::Release);
        self.state = SessionState::OpenNotReady;
        tracing::info!(session_id = %self.id, "session open");
        SessionChannels { scene, clicks }
    }

    /// Handles one inbound text frame.
    ///
    /// Parse and dispatch failures are logged and produce no reply.
    pub async fn handle_text(&mut self, text: &str) -> Vec<OutboundMessage> {
        if !self.is_open() {
            return Vec::new();
        }
        tracing::debug!(session_id = %self.id, frame = text, "frame received");

        let action = match InboundAction::decode(text) {
            Ok(action) => action,
            Err(err) => {
                tracing::warn!(session_id = %self.id, error = %err, "discarding frame");
                return Vec::new();
            }
        };

        match action {
            InboundAction::ClientReady => {
                if self.is_ready() {
                    tracing::debug!(session_id = %self.id, "client_ready repeated");
                } else {
                    self.state = SessionState::OpenReady;
                    self.flags.ready.store(true, Ordering::Release);
                    tracing::info!(session_id = %self.id, "client ready");
                }
                vec![self.snapshot().await]
            }
            InboundAction::Acknowledgment(kind) => {
                tracing::info!(session_id = %self.id, ?kind, "client acknowledged");
                Vec::new()
            }
            InboundAction::DefineProperty {
                object,
                property,
                value,
            } => {
                match self
                    .service
                    .define_property(&object, &property, &value)
                    .await
                {
                    Ok(_) if self.is_ready() => vec![self.snapshot().await],
                    Ok(_) => Vec::new(),
                    Err(err) => {
                        tracing::warn!(
                            session_id = %self.id,
                            object_id = %object,
                            property = %property,
                            value = %value,
                            error = %err,
                            "define_property failed"
                        );
                        Vec::new()
                    }
                }
            }
            InboundAction::Unknown(action) => {
                tracing::debug!(session_id = %self.id, action = %action, "ignoring unknown action");
                Vec::new()
            }
        }
    }

    /// Reacts to a scene change: one full snapshot while ready, nothing
    /// otherwise.
    pub async fn on_scene_event(&self, event: &SceneEvent) -> Option<OutboundMessage> {
        if !self.pushes_snapshots() {
            tracing::trace!(
                session_id = %self.id,
                event = event.event_type_str(),
                "not ready, dropping scene change"
            );
            return None;
        }
        Some(self.snapshot().await)
    }

    /// Reacts to scene changes the subscription skipped.
    ///
    /// Every missed change still gets its own snapshot while ready, so the
    /// client sees one `update_objects` per change. The skipped changes are
    /// already applied, so the snapshots are identical.
    pub async fn on_scene_lagged(&self, skipped: u64) -> Vec<OutboundMessage> {
        tracing::warn!(session_id = %self.id, skipped, "scene subscription lagged");
        if !self.pushes_snapshots() {
            return Vec::new();
        }
        let count = usize::try_from(skipped).unwrap_or(usize::MAX);
        std::iter::repeat_n(self.snapshot().await, count).collect()
    }

    /// Forwards a click, regardless of readiness.
    #[must_use]
    pub fn on_object_clicked(&self, object_id: &ObjectId) -> Option<OutboundMessage> {
        if !self.is_open() {
            return None;
        }
        Some(OutboundMessage::ObjectClicked {
            object_id: object_id.clone(),
        })
    }

    /// Closes the session. Idempotent.
    ///
    /// The click callback is unregistered, but a publish already iterating
    /// may still call it; it then sees the cleared open flag and returns.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.flags.open.store(false, Ordering::Release);
        if let Some(subscription) = self.click_subscription.take() {
            self.service.hub().unregister(subscription);
        }
        self.state = SessionState::Closed;
        tracing::info!(session_id = %self.id, "session closed");
    }

    fn pushes_snapshots(&self) -> bool {
        self.is_open() && self.is_ready()
    }

    async fn snapshot(&self) -> OutboundMessage {
        OutboundMessage::UpdateObjects {
            objects: self.service.snapshot().await,
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{ClickHub, ObjectKind, SceneEventBus, SceneGraph, SceneObject};

    fn service() -> Arc<SceneService> {
        let lamp = SceneObject::new(ObjectId::from("lamp"), "Lamp", ObjectKind::Light);
        let switch = SceneObject::new(ObjectId::from("sw"), "Switch", ObjectKind::Light)
            .with_catalog_id("Scopia#switch");
        let sofa = SceneObject::new(ObjectId::from("sofa"), "Sofa", ObjectKind::Piece);
        Arc::new(SceneService::new(
            Arc::new(SceneGraph::with_objects(vec![lamp, switch, sofa])),
            SceneEventBus::new(64),
            ClickHub::new(),
        ))
    }

    fn open_session(service: &Arc<SceneService>) -> (Session, SessionChannels) {
        let mut session = Session::new(SessionId::new(), Arc::clone(service));
        let channels = session.open();
        (session, channels)
    }

    fn snapshot_len(message: &OutboundMessage) -> usize {
        let OutboundMessage::UpdateObjects { objects } = message else {
            panic!("expected update_objects, got {message:?}");
        };
        objects.len()
    }

    #[tokio::test]
    async fn open_subscribes_and_registers() {
        let svc = service();
        let mut session = Session::new(SessionId::new(), Arc::clone(&svc));
        assert_eq!(session.state(), SessionState::Connecting);
        let _channels = session.open();
        assert_eq!(session.state(), SessionState::OpenNotReady);
        assert_eq!(svc.events().receiver_count(), 1);
        assert_eq!(svc.hub().subscriber_count(), 1);
    }

    #[tokio::test]
    async fn no_snapshot_before_ready() {
        let svc = service();
        let (session, _channels) = open_session(&svc);
        let event = SceneEvent::property_changed(ObjectId::from("lamp"), "power");
        assert!(session.on_scene_event(&event).await.is_none());
        assert!(session.on_scene_lagged(3).await.is_empty());
    }

    #[tokio::test]
    async fn ready_pushes_one_snapshot_then_one_per_change() {
        let svc = service();
        let (mut session, _channels) = open_session(&svc);

        let pushed = session.handle_text(r#"{"action":"client_ready","args":{}}"#).await;
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed.first().map(snapshot_len), Some(2));
        assert!(session.is_ready());
        assert!(session.flags().is_ready());

        let event = SceneEvent::property_changed(ObjectId::from("lamp"), "power");
        let Some(message) = session.on_scene_event(&event).await else {
            panic!("ready session must push on change");
        };
        assert_eq!(snapshot_len(&message), 2);
    }

    #[tokio::test]
    async fn repeated_ready_resends_snapshot() {
        let svc = service();
        let (mut session, _channels) = open_session(&svc);
        let ready = r#"{"action":"client_ready"}"#;
        assert_eq!(session.handle_text(ready).await.len(), 1);
        assert_eq!(session.handle_text(ready).await.len(), 1);
        assert_eq!(session.state(), SessionState::OpenReady);
    }

    #[tokio::test]
    async fn define_property_mutates_and_pushes_when_ready() {
        let svc = service();
        let (mut session, _channels) = open_session(&svc);
        let define = r##"{"action":"define_property","args":{"object":"lamp","property":"color","value":"#FF0000"}}"##;

        assert!(session.handle_text(define).await.is_empty());
        let _ = session.handle_text(r#"{"action":"client_ready"}"#).await;
        assert_eq!(session.handle_text(define).await.len(), 1);

        let Ok(lamp) = svc.scene().get(&ObjectId::from("lamp")).await else {
            panic!("lamp must exist");
        };
        assert_eq!(lamp.color, Some(16_711_680));
    }

    #[tokio::test]
    async fn rejected_define_property_changes_nothing() {
        let svc = service();
        let (mut session, _channels) = open_session(&svc);
        let _ = session.handle_text(r#"{"action":"client_ready"}"#).await;
        let define = r#"{"action":"define_property","args":{"object":"lamp","property":"name","value":"null"}}"#;
        assert!(session.handle_text(define).await.is_empty());
        let Ok(lamp) = svc.scene().get(&ObjectId::from("lamp")).await else {
            panic!("lamp must exist");
        };
        assert_eq!(lamp.name, "Lamp");
        assert!(session.is_open());
    }

    #[tokio::test]
    async fn malformed_frame_keeps_state() {
        let svc = service();
        let (mut session, _channels) = open_session(&svc);
        assert!(session.handle_text("{{{").await.is_empty());
        assert!(session.handle_text(r#"{"args":{}}"#).await.is_empty());
        assert_eq!(session.state(), SessionState::OpenNotReady);
    }

    #[tokio::test]
    async fn acknowledgments_and_unknown_actions_are_silent() {
        let svc = service();
        let (mut session, _channels) = open_session(&svc);
        assert!(session.handle_text(r#"{"action":"test_ack","args":{}}"#).await.is_empty());
        assert!(session.handle_text(r#"{"action":"jump","args":{}}"#).await.is_empty());
        assert_eq!(session.state(), SessionState::OpenNotReady);
    }

    #[tokio::test]
    async fn clicks_reach_unready_sessions() {
        let svc = service();
        let (session, mut channels) = open_session(&svc);
        assert_eq!(svc.hub().publish(&ObjectId::from("sw")), 1);

        let Some(object_id) = channels.clicks.recv().await else {
            panic!("click must be queued");
        };
        assert_eq!(
            session.on_object_clicked(&object_id),
            Some(OutboundMessage::ObjectClicked {
                object_id: ObjectId::from("sw")
            })
        );
    }

    #[tokio::test]
    async fn close_is_idempotent_and_silences_session() {
        let svc = service();
        let (mut session, channels) = open_session(&svc);
        let flags = session.flags();
        session.close();
        session.close();
        assert_eq!(session.state(), SessionState::Closed);
        assert!(!flags.is_open());
        assert_eq!(svc.hub().subscriber_count(), 0);
        assert!(session.on_object_clicked(&ObjectId::from("sw")).is_none());
        assert!(session.handle_text(r#"{"action":"client_ready"}"#).await.is_empty());

        drop(channels);
        assert_eq!(svc.events().receiver_count(), 0);
    }

    #[tokio::test]
    async fn stale_callback_noops_once_closed() {
        let svc = service();
        let (session, mut channels) = open_session(&svc);
        // Registered but no longer open: what an in-flight publish sees.
        session.flags.open.store(false, Ordering::Release);
        assert_eq!(svc.hub().publish(&ObjectId::from("sw")), 1);
        assert!(channels.clicks.try_recv().is_err());
    }

    #[tokio::test]
    async fn drop_unregisters_click_callback() {
        let svc = service();
        {
            let (_session, _channels) = open_session(&svc);
            assert_eq!(svc.hub().subscriber_count(), 1);
        }
        assert_eq!(svc.hub().subscriber_count(), 0);
    }

    #[tokio::test]
    async fn ready_survives_close_but_pushes_stop() {
        let svc = service();
        let (mut session, _channels) = open_session(&svc);
        let _ = session.handle_text(r#"{"action":"client_ready"}"#).await;
        let flags = session.flags();
        session.close();

        assert!(session.is_ready());
        assert!(flags.is_ready());
        assert!(!flags.is_open());
        let event = SceneEvent::property_changed(ObjectId::from("lamp"), "power");
        assert!(session.on_scene_event(&event).await.is_none());
        assert!(session.on_scene_lagged(2).await.is_empty());
    }

    #[tokio::test]
    async fn lagging_subscription_still_pushes_once_per_change() {
        let lamp = SceneObject::new(ObjectId::from("lamp"), "Lamp", ObjectKind::Light);
        let svc = Arc::new(SceneService::new(
            Arc::new(SceneGraph::with_objects(vec![lamp])),
            SceneEventBus::new(2),
            ClickHub::new(),
        ));
        let (mut session, mut channels) = open_session(&svc);
        let _ = session.handle_text(r#"{"action":"client_ready"}"#).await;

        let lamp = ObjectId::from("lamp");
        for power in ["0.1", "0.2", "0.3", "0.4", "0.5"] {
            assert!(svc.define_property(&lamp, "power", power).await.is_ok());
        }

        let mut pushed = Vec::new();
        while let Ok(received) =
            tokio::time::timeout(std::time::Duration::from_millis(50), channels.scene.recv()).await
        {
            match received {
                Ok(event) => pushed.extend(session.on_scene_event(&event).await),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    pushed.extend(session.on_scene_lagged(skipped).await);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
        assert_eq!(pushed.len(), 5);
        assert!(pushed.iter().all(|m| m.action() == "update_objects"));
    }
}
