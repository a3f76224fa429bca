//! Click handler.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{ClickRequest, ClickResponse, ClickTarget};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, SyncError};

/// `POST /clicks` — Click an object, by id or by plan point.
///
/// # Errors
///
/// Returns [`SyncError::InvalidRequest`] for an ambiguous target and
/// [`SyncError::ObjectNotFound`] for an unknown object id.
#[utoipa::path(
    post,
    path = "/api/v1/clicks",
    tag = "Clicks",
    summary = "Click an object",
    description = "Clicking a switch toggles its power and sends `object_clicked` to every connected session, ready or not. Other objects are ignored.",
    request_body = ClickRequest,
    responses(
        (status = 200, description = "Click handled", body = ClickResponse),
        (status = 400, description = "Neither or both of object_id and x/y", body = ErrorResponse),
        (status = 404, description = "Object not found", body = ErrorResponse),
    )
)]
pub async fn click(
    State(state): State<AppState>,
    Json(req): Json<ClickRequest>,
) -> Result<impl IntoResponse, SyncError> {
    let outcome = match req.target()? {
        ClickTarget::Object(object_id) => state.service.click(&object_id).await?,
        ClickTarget::Point { x, y } => state.service.click_at(x, y).await?,
    };
    Ok(Json(ClickResponse::from(outcome)))
}

/// Click routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/clicks", post(click))
}
