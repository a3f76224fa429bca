//! Axum WebSocket upgrade handler.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::http::header::SEC_WEBSOCKET_PROTOCOL;
use axum::response::IntoResponse;

use super::connection::run_connection;
use super::session::Session;
use crate::app_state::AppState;
use crate::domain::SessionId;

/// Sub-protocol accepted when offered. Clients that do not offer it are
/// served identically.
pub const SUB_PROTOCOL: &str = "scratchomised";

/// Returns the accepted sub-protocol if the client offered it.
fn negotiated_protocol(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SEC_WEBSOCKET_PROTOCOL)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .find(|offered| offered.eq_ignore_ascii_case(SUB_PROTOCOL))
        .map(|_| SUB_PROTOCOL.to_string())
}

/// `GET /` — Upgrade HTTP connection to WebSocket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let protocol = negotiated_protocol(&headers);
    let session_id = SessionId::new();
    match &protocol {
        Some(protocol) => tracing::info!(%session_id, %remote_addr, protocol = %protocol, "ws connection accepted"),
        None => tracing::info!(%session_id, %remote_addr, "ws connection accepted in compatibility mode"),
    }

    let session = Session::new(session_id, Arc::clone(&state.service));
    let sessions = Arc::clone(&state.sessions);

    ws.protocols([SUB_PROTOCOL])
        .max_message_size(state.max_message_bytes)
        .max_frame_size(state.max_message_bytes)
        .on_upgrade(move |socket| run_connection(socket, session, sessions, remote_addr, protocol))
}
