//! Serialized form of scene objects, shared by scene files and the
//! object-creation endpoint.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{ObjectId, ObjectKind, SceneObject};

/// One object record. Everything but `name` is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRecord {
    /// Stable identifier; generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Catalog identifier used for classification.
    #[serde(default)]
    pub catalog_id: Option<String>,
    /// `piece` (default), `light` or `doorOrWindow`.
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "light")]
    pub kind: Option<ObjectKind>,
    /// Type hierarchy, most specific first; defaults from `kind`.
    #[serde(default)]
    pub type_tags: Option<Vec<String>>,
    /// Plan abscissa of the centre.
    pub x: Option<f32>,
    /// Plan ordinate of the centre.
    pub y: Option<f32>,
    /// Vertical position.
    pub z: Option<f32>,
    /// Rotation angle in radians.
    pub angle: Option<f32>,
    /// Width.
    pub width: Option<f32>,
    /// Depth.
    pub depth: Option<f32>,
    /// Height.
    pub height: Option<f32>,
    /// Elevation above the floor.
    pub elevation: Option<f32>,
    /// Visibility.
    pub visible: Option<bool>,
    /// Lock state.
    pub locked: Option<bool>,
    /// Model reference.
    pub model: Option<String>,
    /// Packed RGB color.
    pub color: Option<i32>,
    /// Texture reference.
    pub texture: Option<String>,
    /// Shininess.
    pub shininess: Option<f32>,
    /// Light power; ignored for non-light kinds.
    pub power: Option<f32>,
    /// Packed RGB light color; ignored for non-light kinds.
    pub light_color: Option<i32>,
    /// Whether the name is drawn on the plan.
    pub name_visible: Option<bool>,
    /// Whether the model is mirrored.
    pub model_mirrored: Option<bool>,
    /// Free-form description.
    pub description: Option<String>,
}

impl ObjectRecord {
    /// Builds the scene object, filling gaps with the kind's defaults.
    #[must_use]
    pub fn into_scene_object(self) -> SceneObject {
        let kind = self.kind.unwrap_or_default();
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .map_or_else(ObjectId::generate, ObjectId::from);
        let mut object = SceneObject::new(id, self.name, kind);

        object.catalog_id = self.catalog_id;
        if let Some(tags) = self.type_tags.filter(|tags| !tags.is_empty()) {
            object.type_tags = tags;
        }
        let floats = [
            (&mut object.x, self.x),
            (&mut object.y, self.y),
            (&mut object.z, self.z),
            (&mut object.angle, self.angle),
            (&mut object.width, self.width),
            (&mut object.depth, self.depth),
            (&mut object.height, self.height),
            (&mut object.elevation, self.elevation),
        ];
        for (field, value) in floats {
            if let Some(value) = value {
                *field = value;
            }
        }
        object.visible = self.visible.unwrap_or(object.visible);
        object.locked = self.locked.unwrap_or(object.locked);
        object.name_visible = self.name_visible.unwrap_or(object.name_visible);
        object.model_mirrored = self.model_mirrored.unwrap_or(object.model_mirrored);
        object.model = self.model;
        object.color = self.color;
        object.texture = self.texture;
        object.shininess = self.shininess;
        object.description = self.description;
        if kind == ObjectKind::Light {
            object.power = self.power.unwrap_or(object.power);
            object.light_color = self.light_color;
        }
        object
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn minimal_record_gets_defaults() {
        let Ok(record) = serde_json::from_str::<ObjectRecord>(r#"{"name":"Lamp","kind":"light"}"#)
        else {
            panic!("minimal record must parse");
        };
        let object = record.into_scene_object();
        assert!(object.id.as_str().starts_with("object-"));
        assert_eq!(object.kind, ObjectKind::Light);
        assert_eq!(object.type_tags, ObjectKind::Light.default_type_tags());
        assert!((object.power - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn fields_are_copied() {
        let json = r#"{"id":"sw","name":"Switch","catalogId":"Scopia#switch","x":10,"y":20,
            "color":255,"visible":false,"lightColor":7}"#;
        let Ok(record) = serde_json::from_str::<ObjectRecord>(json) else {
            panic!("record must parse");
        };
        let object = record.into_scene_object();
        assert_eq!(object.id.as_str(), "sw");
        assert_eq!(object.catalog_id.as_deref(), Some("Scopia#switch"));
        assert!((object.x - 10.0).abs() < f32::EPSILON);
        assert_eq!(object.color, Some(255));
        assert!(!object.visible);
        // Light color only applies to lights.
        assert_eq!(object.light_color, None);
    }
}
