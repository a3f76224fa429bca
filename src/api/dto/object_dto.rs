//! Scene object DTOs: snapshot listing, creation and property writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{ObjectId, PropertyValue};
use crate::service::ObjectProjection;

/// Response body for `GET /objects`: the same projection clients receive
/// in `update_objects`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SnapshotResponse {
    /// Projections of every qualifying object, in scene order.
    #[schema(value_type = Vec<Object>)]
    pub objects: Vec<ObjectProjection>,
    /// Number of projected objects.
    pub count: usize,
}

/// Response body for `POST /objects` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateObjectResponse {
    /// Identifier of the new object.
    #[schema(value_type = String)]
    pub object_id: ObjectId,
    /// Server creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Request body for `PUT /objects/{id}/properties/{property}`.
///
/// `value` may be any JSON value; non-strings are written from their JSON
/// text and a missing value means `null`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetPropertyRequest {
    /// New value, usually a string such as `"#FF0000"` or `"null"`.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
}

/// Response body for a successful property write.
#[derive(Debug, Serialize, ToSchema)]
pub struct SetPropertyResponse {
    /// Mutated object.
    #[schema(value_type = String)]
    pub object_id: ObjectId,
    /// Property name.
    pub property: String,
    /// Value actually stored, after coercion.
    #[schema(value_type = Object)]
    pub value: PropertyValue,
}
