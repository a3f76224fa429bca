//! WebSocket connection loop.
//!
//! Drives one [`Session`]: reads frames from the client, scene-change
//! notifications, queued clicks and the close-all signal, and writes
//! whatever the session asks to push, in the order it was produced.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::OutboundMessage;
use super::registry::SessionRegistry;
use super::session::{Session, SessionChannels};

/// Runs the read/write loop for a single WebSocket connection.
///
/// Returns once the client disconnects, a send fails, or the registry
/// asks every session to close. The session is closed and deregistered
/// on every exit path.
pub async fn run_connection(
    socket: WebSocket,
    mut session: Session,
    sessions: Arc<SessionRegistry>,
    remote_addr: SocketAddr,
    protocol: Option<String>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let SessionChannels {
        scene: mut scene_rx,
        clicks: mut click_rx,
    } = session.open();
    let session_id = session.id();
    let mut shutdown = sessions.shutdown_signal();
    sessions.insert(session_id, remote_addr, protocol, session.flags());

    let mut closing = *shutdown.borrow_and_update();
    while !closing {
        let outbound: Vec<OutboundMessage> = tokio::select! {
            // Incoming frame from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => session.handle_text(text.as_str()).await,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => Vec::new(),
                    Some(Err(err)) => {
                        tracing::debug!(%session_id, error = %err, "ws receive failed");
                        break;
                    }
                }
            }
            // Scene change
            event = scene_rx.recv() => {
                match event {
                    Ok(event) => session.on_scene_event(&event).await.into_iter().collect(),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        session.on_scene_lagged(skipped).await
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            // Click forwarded by the hub
            Some(object_id) = click_rx.recv() => {
                session.on_object_clicked(&object_id).into_iter().collect()
            }
            // Server stopping
            _ = shutdown.changed() => {
                closing = true;
                Vec::new()
            }
        };

        for message in &outbound {
            if !send(&mut ws_tx, &session, message).await {
                closing = true;
                break;
            }
        }
    }

    session.close();
    sessions.remove(session_id);
    drop(scene_rx);
    if ws_tx.send(Message::Close(None)).await.is_err() {
        tracing::trace!(%session_id, "peer already gone");
    }
    tracing::debug!(%session_id, %remote_addr, "ws connection closed");
}

/// Sends one message if the session is still open.
///
/// Returns `false` when the transport is gone.
async fn send(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    session: &Session,
    message: &OutboundMessage,
) -> bool {
    if !session.is_open() {
        return false;
    }
    let text = match message.encode() {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(session_id = %session.id(), action = message.action(), error = %err, "cannot encode message");
            return true;
        }
    };
    match ws_tx.send(Message::text(text)).await {
        Ok(()) => {
            tracing::debug!(session_id = %session.id(), action = message.action(), "message sent");
            true
        }
        Err(err) => {
            tracing::debug!(session_id = %session.id(), error = %err, "send failed, peer disconnected");
            false
        }
    }
}
