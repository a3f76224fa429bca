//! Session listing handler.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{SessionDto, SessionListResponse};
use crate::app_state::AppState;

/// `GET /sessions` — Connected WebSocket sessions.
#[utoipa::path(
    get,
    path = "/api/v1/sessions",
    tag = "Sessions",
    summary = "List sessions",
    description = "Returns every live WebSocket session with its readiness and negotiated sub-protocol.",
    responses(
        (status = 200, description = "Live sessions", body = SessionListResponse),
    )
)]
pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let data: Vec<SessionDto> = state
        .sessions
        .list()
        .into_iter()
        .map(SessionDto::from)
        .collect();
    Json(SessionListResponse {
        count: data.len(),
        data,
    })
}

/// Session routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/sessions", get(list_sessions))
}
