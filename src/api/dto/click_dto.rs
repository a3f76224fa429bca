//! Click DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{ObjectId, PropertyValue};
use crate::error::SyncError;
use crate::service::ClickOutcome;

/// Request body for `POST /clicks`: either an object id or a plan point.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ClickRequest {
    /// Object to click.
    #[serde(default)]
    pub object_id: Option<String>,
    /// Plan abscissa, with `y`.
    #[serde(default)]
    pub x: Option<f32>,
    /// Plan ordinate, with `x`.
    #[serde(default)]
    pub y: Option<f32>,
}

/// What a click request designates.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickTarget {
    /// A known object id.
    Object(ObjectId),
    /// A plan point resolved by the picker.
    Point {
        /// Abscissa.
        x: f32,
        /// Ordinate.
        y: f32,
    },
}

impl ClickRequest {
    /// Validates the request.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidRequest`] unless exactly one of
    /// `object_id` or the `x`/`y` pair is given.
    pub fn target(&self) -> Result<ClickTarget, SyncError> {
        match (&self.object_id, self.x, self.y) {
            (Some(id), None, None) if !id.trim().is_empty() => {
                Ok(ClickTarget::Object(ObjectId::from(id.as_str())))
            }
            (None, Some(x), Some(y)) => Ok(ClickTarget::Point { x, y }),
            _ => Err(SyncError::InvalidRequest(
                "expected either 'object_id' or both 'x' and 'y'".to_string(),
            )),
        }
    }
}

/// Response body for `POST /clicks`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ClickResponse {
    /// `switched` or `ignored`.
    pub outcome: String,
    /// Clicked switch, if any.
    #[schema(value_type = Option<String>)]
    pub object_id: Option<ObjectId>,
    /// New power value of the switch, if it has one.
    #[schema(value_type = Object)]
    pub power: Option<PropertyValue>,
    /// Number of click subscribers notified.
    pub notified: usize,
}

impl From<ClickOutcome> for ClickResponse {
    fn from(outcome: ClickOutcome) -> Self {
        match outcome {
            ClickOutcome::Ignored => Self {
                outcome: "ignored".to_string(),
                object_id: None,
                power: None,
                notified: 0,
            },
            ClickOutcome::Switched {
                object_id,
                power,
                notified,
            } => Self {
                outcome: "switched".to_string(),
                object_id: Some(object_id),
                power,
                notified,
            },
        }
    }
}
