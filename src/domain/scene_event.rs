//! Scene-change notifications.
//!
//! Every committed scene mutation emits a [`SceneEvent`] through the
//! [`super::SceneEventBus`]. Sessions treat any event as a signal to
//! resynchronize with a full snapshot, so events carry only enough to log.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ObjectId;

/// Domain event emitted after every scene mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum SceneEvent {
    /// An object was added to the scene.
    ObjectAdded {
        /// New object identifier.
        object_id: ObjectId,
        /// Time of insertion.
        timestamp: DateTime<Utc>,
    },

    /// A property of a tracked object changed.
    PropertyChanged {
        /// Mutated object.
        object_id: ObjectId,
        /// Property name.
        property: String,
        /// Time of the change.
        timestamp: DateTime<Utc>,
    },
}

impl SceneEvent {
    /// Creates an [`SceneEvent::ObjectAdded`] stamped now.
    #[must_use]
    pub fn added(object_id: ObjectId) -> Self {
        Self::ObjectAdded {
            object_id,
            timestamp: Utc::now(),
        }
    }

    /// Creates a [`SceneEvent::PropertyChanged`] stamped now.
    #[must_use]
    pub fn property_changed(object_id: ObjectId, property: impl Into<String>) -> Self {
        Self::PropertyChanged {
            object_id,
            property: property.into(),
            timestamp: Utc::now(),
        }
    }

    /// Returns the object this event concerns.
    #[must_use]
    pub fn object_id(&self) -> &ObjectId {
        match self {
            Self::ObjectAdded { object_id, .. } | Self::PropertyChanged { object_id, .. } => {
                object_id
            }
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::ObjectAdded { .. } => "object_added",
            Self::PropertyChanged { .. } => "property_changed",
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn property_changed_serializes_with_tag() {
        let event = SceneEvent::property_changed(ObjectId::from("lamp"), "power");
        let Ok(json) = serde_json::to_string(&event) else {
            panic!("serialization failed");
        };
        assert!(json.contains("\"event_type\":\"property_changed\""));
        assert!(json.contains("\"property\":\"power\""));
    }

    #[test]
    fn object_id_accessor() {
        let event = SceneEvent::added(ObjectId::from("switch-2"));
        assert_eq!(event.object_id().as_str(), "switch-2");
        assert_eq!(event.event_type_str(), "object_added");
    }
}
