//! Scene object handlers: snapshot, create, property write.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{
    CreateObjectResponse, SetPropertyRequest, SetPropertyResponse, SnapshotResponse,
};
use crate::app_state::AppState;
use crate::domain::ObjectId;
use crate::error::{ErrorResponse, SyncError};
use crate::persistence::ObjectRecord;
use crate::ws::messages::value_as_text;

/// `GET /objects` — Current filtered snapshot.
#[utoipa::path(
    get,
    path = "/api/v1/objects",
    tag = "Objects",
    summary = "Current snapshot",
    description = "Returns the filtered scene snapshot exactly as pushed to ready clients in `update_objects`.",
    responses(
        (status = 200, description = "Filtered snapshot", body = SnapshotResponse),
    )
)]
pub async fn list_objects(State(state): State<AppState>) -> impl IntoResponse {
    let objects = state.service.snapshot().await;
    Json(SnapshotResponse {
        count: objects.len(),
        objects,
    })
}

/// `POST /objects` — Add an object to the scene.
///
/// # Errors
///
/// Returns [`SyncError::InvalidRequest`] if the id is already taken.
#[utoipa::path(
    post,
    path = "/api/v1/objects",
    tag = "Objects",
    summary = "Add an object",
    description = "Adds an object to the scene. Ready clients receive a fresh snapshot.",
    request_body = ObjectRecord,
    responses(
        (status = 201, description = "Object added", body = CreateObjectResponse),
        (status = 400, description = "Duplicate id or invalid record", body = ErrorResponse),
    )
)]
pub async fn create_object(
    State(state): State<AppState>,
    Json(record): Json<ObjectRecord>,
) -> Result<impl IntoResponse, SyncError> {
    if record.name.trim().is_empty() {
        return Err(SyncError::InvalidRequest("name must not be empty".to_string()));
    }
    let object_id = state.service.add_object(record.into_scene_object()).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateObjectResponse {
            object_id,
            created_at: Utc::now(),
        }),
    ))
}

/// `PUT /objects/{id}/properties/{property}` — Write one property.
///
/// # Errors
///
/// Returns [`SyncError::ObjectNotFound`] for an unknown object and
/// [`SyncError::Dispatch`] when the value is rejected.
#[utoipa::path(
    put,
    path = "/api/v1/objects/{id}/properties/{property}",
    tag = "Objects",
    summary = "Write a property",
    description = "Coerces the textual value to the property's declared type and writes it, exactly like a `define_property` message.",
    params(
        ("id" = String, Path, description = "Object identifier"),
        ("property" = String, Path, description = "Property name, e.g. `color`"),
    ),
    request_body = SetPropertyRequest,
    responses(
        (status = 200, description = "Property written", body = SetPropertyResponse),
        (status = 404, description = "Object not found", body = ErrorResponse),
        (status = 422, description = "No setter, type mismatch or null not allowed", body = ErrorResponse),
    )
)]
pub async fn set_property(
    State(state): State<AppState>,
    Path((id, property)): Path<(String, String)>,
    Json(req): Json<SetPropertyRequest>,
) -> Result<impl IntoResponse, SyncError> {
    let object_id = ObjectId::from(id);
    let text = value_as_text(Some(req.value));
    let value = state
        .service
        .define_property(&object_id, &property, &text)
        .await?;
    Ok(Json(SetPropertyResponse {
        object_id,
        property,
        value,
    }))
}

/// Object routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/objects", get(list_objects).post(create_object))
        .route("/objects/{id}/properties/{property}", put(set_property))
}
