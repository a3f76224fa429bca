//! Scene objects as owned by the host scene graph.
//!
//! A [`SceneObject`] is one piece of furniture in the home: its identity,
//! classification data (type tags, catalog id, name) and the typed fields
//! that the property tables in [`super::properties`] read and write.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use super::ObjectId;

/// Type tag every object implicitly derives from; ignored by classification.
pub const ROOT_TYPE_TAG: &str = "Object";

/// Concrete object type. Selects the property descriptor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectKind {
    /// Plain piece of furniture.
    #[default]
    Piece,
    /// Light source with a power level.
    Light,
    /// Door or window embedded in a wall.
    DoorOrWindow,
}

impl ObjectKind {
    /// Returns the type hierarchy of this kind, most specific first.
    #[must_use]
    pub fn default_type_tags(self) -> Vec<String> {
        let tags: &[&str] = match self {
            Self::Piece => &["HomePieceOfFurniture"],
            Self::Light => &["HomeLight", "HomePieceOfFurniture"],
            Self::DoorOrWindow => &["HomeDoorOrWindow", "HomePieceOfFurniture"],
        };
        tags.iter().map(|t| (*t).to_string()).collect()
    }

    /// Returns the kind as the string used in scene files and requests.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Piece => "piece",
            Self::Light => "light",
            Self::DoorOrWindow => "doorOrWindow",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "piece" | "furniture" => Ok(Self::Piece),
            "light" => Ok(Self::Light),
            "doororwindow" | "door_or_window" => Ok(Self::DoorOrWindow),
            other => Err(format!("unknown object kind: {other}")),
        }
    }
}

/// A dynamically typed property value, as read from or written to an object.
///
/// Serializes untagged, so `Null` becomes an explicit JSON `null`. Floats
/// go out in their shortest decimal form (`0.8`, not `0.800000011920929`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// 32-bit signed integer (colors are packed RGB).
    Int(i32),
    /// Single-precision float.
    #[serde(serialize_with = "serialize_shortest_f32")]
    Float(f32),
    /// Free text.
    Text(String),
    /// Boolean flag.
    Bool(bool),
    /// Absent value.
    Null,
}

impl PropertyValue {
    /// Wraps an optional integer, mapping `None` to [`PropertyValue::Null`].
    #[must_use]
    pub fn from_opt_int(v: Option<i32>) -> Self {
        v.map_or(Self::Null, Self::Int)
    }

    /// Wraps an optional float, mapping `None` to [`PropertyValue::Null`].
    #[must_use]
    pub fn from_opt_float(v: Option<f32>) -> Self {
        v.map_or(Self::Null, Self::Float)
    }

    /// Wraps an optional string, mapping `None` to [`PropertyValue::Null`].
    #[must_use]
    pub fn from_opt_text(v: Option<&str>) -> Self {
        v.map_or(Self::Null, |s| Self::Text(s.to_string()))
    }

    /// Returns `true` for [`PropertyValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the numeric value as `f64`, if any.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(f64::from(*v)),
            Self::Float(v) => Some(f64::from(*v)),
            _ => None,
        }
    }
}

/// Writes an `f32` as the `f64` nearest to its shortest decimal text, so
/// widening does not leak binary noise onto the wire.
fn serialize_shortest_f32<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    match value.to_string().parse::<f64>() {
        Ok(wide) if wide.is_finite() => serializer.serialize_f64(wide),
        _ => serializer.serialize_f32(*value),
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Null => f.write_str("null"),
        }
    }
}

/// One item of the host's scene.
///
/// Fields not meaningful for a kind (e.g. `power` on a plain piece) are kept
/// but hidden by that kind's descriptor table, so they project as `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    /// Stable identifier.
    pub id: ObjectId,
    /// Display name (possibly localized).
    pub name: String,
    /// Untranslated catalog reference, e.g. `"Scopia#square-switch"`.
    pub catalog_id: Option<String>,
    /// Concrete type; selects the property table.
    pub kind: ObjectKind,
    /// Type hierarchy, most specific first.
    pub type_tags: Vec<String>,
    /// Plan abscissa of the centre.
    pub x: f32,
    /// Plan ordinate of the centre.
    pub y: f32,
    /// Height of the object base above the floor.
    pub z: f32,
    /// Rotation angle in radians.
    pub angle: f32,
    /// Width.
    pub width: f32,
    /// Depth.
    pub depth: f32,
    /// Height.
    pub height: f32,
    /// Elevation relative to its level.
    pub elevation: f32,
    /// Whether the object is drawn.
    pub visible: bool,
    /// Whether the plan is locked for this object. Host-controlled.
    pub locked: bool,
    /// Model reference. Host-controlled.
    pub model: Option<String>,
    /// Packed RGB color, `None` for the model's own colors.
    pub color: Option<i32>,
    /// Texture reference.
    pub texture: Option<String>,
    /// Shininess in `[0, 1]`, `None` for the model's default.
    pub shininess: Option<f32>,
    /// Light power in `[0, 1]`. Lights only.
    pub power: f32,
    /// Packed RGB light color. Lights only.
    pub light_color: Option<i32>,
    /// Whether the name is shown in the plan.
    pub name_visible: bool,
    /// Whether the model is mirrored.
    pub model_mirrored: bool,
    /// Free description.
    pub description: Option<String>,
}

impl SceneObject {
    /// Creates an object of the given kind with default geometry and the
    /// kind's default type tags.
    #[must_use]
    pub fn new(id: ObjectId, name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            id,
            name: name.into(),
            catalog_id: None,
            kind,
            type_tags: kind.default_type_tags(),
            x: 0.0,
            y: 0.0,
            z: 0.0,
            angle: 0.0,
            width: 50.0,
            depth: 50.0,
            height: 50.0,
            elevation: 0.0,
            visible: true,
            locked: false,
            model: None,
            color: None,
            texture: None,
            shininess: None,
            power: if kind == ObjectKind::Light { 0.5 } else { 0.0 },
            light_color: None,
            name_visible: false,
            model_mirrored: false,
            description: None,
        }
    }

    /// Sets the catalog identifier.
    #[must_use]
    pub fn with_catalog_id(mut self, catalog_id: impl Into<String>) -> Self {
        self.catalog_id = Some(catalog_id.into());
        self
    }

    /// Moves the object centre to `(x, y)`.
    #[must_use]
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Returns the type tags without the universal root tag.
    pub fn specific_type_tags(&self) -> impl Iterator<Item = &str> {
        self.type_tags
            .iter()
            .map(String::as_str)
            .filter(|t| *t != ROOT_TYPE_TAG)
    }
}
