//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::SceneService;
use crate::ws::SessionRegistry;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Scene service for all business logic.
    pub service: Arc<SceneService>,
    /// Live WebSocket sessions of this server run.
    pub sessions: Arc<SessionRegistry>,
    /// Maximum inbound WebSocket message size, in bytes.
    pub max_message_bytes: usize,
}
