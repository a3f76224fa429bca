//! Session listing DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::ws::SessionInfo;

/// One connected WebSocket session.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionDto {
    /// Session identifier.
    pub session_id: uuid::Uuid,
    /// Peer address.
    pub remote_addr: String,
    /// Negotiated sub-protocol, absent in compatibility mode.
    pub protocol: Option<String>,
    /// Whether the client completed the readiness handshake.
    pub ready: bool,
    /// Accept time.
    pub connected_at: DateTime<Utc>,
}

impl From<SessionInfo> for SessionDto {
    fn from(info: SessionInfo) -> Self {
        Self {
            session_id: *info.id.as_uuid(),
            remote_addr: info.remote_addr.to_string(),
            protocol: info.protocol,
            ready: info.ready,
            connected_at: info.connected_at,
        }
    }
}

/// Response body for `GET /sessions`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionListResponse {
    /// Live sessions, oldest first.
    pub data: Vec<SessionDto>,
    /// Number of live sessions.
    pub count: usize,
}
