//! Property dispatch: typed accessors and mutators per object kind.
//!
//! Each [`ObjectKind`] owns a static table of [`PropertyDescriptor`]s built
//! once on first use. Writing a property from text is a two-step process:
//!
//! 1. [`resolve_setter`] probes the table in the fixed order of
//!    [`ValueType::PROBE_ORDER`] and picks the first descriptor with a
//!    mutator for the name. Its type becomes the declared type.
//! 2. [`coerce`] converts the text to a [`PropertyValue`] of that type,
//!    which the mutator then stores.
//!
//! | Declared type            | Accepted text                               |
//! |--------------------------|---------------------------------------------|
//! | boxed / primitive int    | decimal, or hex after `0x`, `0X` or `#`     |
//! | boxed / primitive float  | decimal float literal                       |
//! | boxed / primitive bool   | `true` (any case) is true, anything else false |
//! | string                   | passed through unchanged                    |
//! | `null` or blank          | only for boxed int and boxed float          |

use std::fmt;
use std::sync::LazyLock;

use thiserror::Error;

use super::scene_object::{PropertyValue, SceneObject};
use super::{ObjectId, ObjectKind};

/// Declared value type of a property mutator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Nullable 32-bit integer.
    BoxedInt,
    /// Nullable float.
    BoxedFloat,
    /// String.
    Text,
    /// Boolean passed by reference (not nullable from text).
    BoxedBool,
    /// Primitive 32-bit integer.
    Int,
    /// Primitive float.
    Float,
    /// Primitive boolean.
    Bool,
}

impl ValueType {
    /// Order in which mutator types are probed for a property name.
    pub const PROBE_ORDER: [Self; 7] = [
        Self::BoxedInt,
        Self::BoxedFloat,
        Self::Text,
        Self::BoxedBool,
        Self::Int,
        Self::Float,
        Self::Bool,
    ];

    /// Returns `true` if text `null` may reset a property of this type.
    #[must_use]
    pub const fn is_nullable(self) -> bool {
        matches!(self, Self::BoxedInt | Self::BoxedFloat)
    }

    /// Returns a short type name for logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BoxedInt => "Integer",
            Self::BoxedFloat => "Float",
            Self::Text => "String",
            Self::BoxedBool => "Boolean",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "boolean",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure to apply a textual property write.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    /// No mutator exists for the property on this object's type.
    #[error("no setter found for property '{property}'")]
    NoSetterFound {
        /// Requested property name.
        property: String,
    },

    /// The value could not be converted to, or stored as, the declared type.
    #[error("value '{value}' does not fit property '{property}' of type {expected}")]
    TypeMismatch {
        /// Requested property name.
        property: String,
        /// Declared type of the mutator.
        expected: ValueType,
        /// Offending textual value.
        value: String,
    },

    /// A `null`/blank reset was requested for a non-nullable type.
    #[error("cannot reset property '{property}' of type {expected} to null")]
    NullNotAllowed {
        /// Requested property name.
        property: String,
        /// Declared type of the mutator.
        expected: ValueType,
    },

    /// The target object does not exist in the scene.
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),
}

/// Reads a property from an object.
pub type Getter = fn(&SceneObject) -> PropertyValue;

/// Stores an already-coerced value into an object.
///
/// Fails with [`MismatchedValue`] if the value variant does not match what
/// the field holds.
pub type Setter = fn(&mut SceneObject, PropertyValue) -> Result<(), MismatchedValue>;

/// Marker returned by a [`Setter`] given a value of the wrong variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MismatchedValue;

/// Accessor/mutator pair for one property name and declared type.
#[derive(Debug, Clone, Copy)]
pub struct PropertyDescriptor {
    /// Property name as used on the wire (camelCase).
    pub name: &'static str,
    /// Declared type of the mutator.
    pub value_type: ValueType,
    /// Accessor.
    pub get: Getter,
    /// Mutator; `None` for read-only properties.
    pub set: Option<Setter>,
}

fn rw(name: &'static str, value_type: ValueType, get: Getter, set: Setter) -> PropertyDescriptor {
    PropertyDescriptor {
        name,
        value_type,
        get,
        set: Some(set),
    }
}

fn ro(name: &'static str, value_type: ValueType, get: Getter) -> PropertyDescriptor {
    PropertyDescriptor {
        name,
        value_type,
        get,
        set: None,
    }
}

fn float(v: PropertyValue) -> Result<f32, MismatchedValue> {
    match v {
        PropertyValue::Float(f) => Ok(f),
        _ => Err(MismatchedValue),
    }
}

fn opt_float(v: PropertyValue) -> Result<Option<f32>, MismatchedValue> {
    match v {
        PropertyValue::Float(f) => Ok(Some(f)),
        PropertyValue::Null => Ok(None),
        _ => Err(MismatchedValue),
    }
}

fn opt_int(v: PropertyValue) -> Result<Option<i32>, MismatchedValue> {
    match v {
        PropertyValue::Int(i) => Ok(Some(i)),
        PropertyValue::Null => Ok(None),
        _ => Err(MismatchedValue),
    }
}

fn boolean(v: PropertyValue) -> Result<bool, MismatchedValue> {
    match v {
        PropertyValue::Bool(b) => Ok(b),
        _ => Err(MismatchedValue),
    }
}

fn text(v: PropertyValue) -> Result<String, MismatchedValue> {
    match v {
        PropertyValue::Text(s) => Ok(s),
        _ => Err(MismatchedValue),
    }
}

fn piece_descriptors() -> Vec<PropertyDescriptor> {
    use ValueType::{Bool, BoxedFloat, BoxedInt, Float, Text};

    vec![
        rw("name", Text, |o| PropertyValue::Text(o.name.clone()), |o, v| {
            o.name = text(v)?;
            Ok(())
        }),
        rw("x", Float, |o| PropertyValue::Float(o.x), |o, v| {
            o.x = float(v)?;
            Ok(())
        }),
        rw("y", Float, |o| PropertyValue::Float(o.y), |o, v| {
            o.y = float(v)?;
            Ok(())
        }),
        rw("z", Float, |o| PropertyValue::Float(o.z), |o, v| {
            o.z = float(v)?;
            Ok(())
        }),
        rw("angle", Float, |o| PropertyValue::Float(o.angle), |o, v| {
            o.angle = float(v)?;
            Ok(())
        }),
        rw("width", Float, |o| PropertyValue::Float(o.width), |o, v| {
            o.width = float(v)?;
            Ok(())
        }),
        rw("depth", Float, |o| PropertyValue::Float(o.depth), |o, v| {
            o.depth = float(v)?;
            Ok(())
        }),
        rw("height", Float, |o| PropertyValue::Float(o.height), |o, v| {
            o.height = float(v)?;
            Ok(())
        }),
        rw("elevation", Float, |o| PropertyValue::Float(o.elevation), |o, v| {
            o.elevation = float(v)?;
            Ok(())
        }),
        rw("visible", Bool, |o| PropertyValue::Bool(o.visible), |o, v| {
            o.visible = boolean(v)?;
            Ok(())
        }),
        rw("nameVisible", Bool, |o| PropertyValue::Bool(o.name_visible), |o, v| {
            o.name_visible = boolean(v)?;
            Ok(())
        }),
        rw("modelMirrored", Bool, |o| PropertyValue::Bool(o.model_mirrored), |o, v| {
            o.model_mirrored = boolean(v)?;
            Ok(())
        }),
        ro("locked", Bool, |o| PropertyValue::Bool(o.locked)),
        ro("model", Text, |o| PropertyValue::from_opt_text(o.model.as_deref())),
        rw("color", BoxedInt, |o| PropertyValue::from_opt_int(o.color), |o, v| {
            o.color = opt_int(v)?;
            Ok(())
        }),
        rw(
            "texture",
            Text,
            |o| PropertyValue::from_opt_text(o.texture.as_deref()),
            |o, v| {
                o.texture = Some(text(v)?);
                Ok(())
            },
        ),
        rw(
            "shininess",
            BoxedFloat,
            |o| PropertyValue::from_opt_float(o.shininess),
            |o, v| {
                o.shininess = opt_float(v)?;
                Ok(())
            },
        ),
        rw(
            "description",
            Text,
            |o| PropertyValue::from_opt_text(o.description.as_deref()),
            |o, v| {
                o.description = Some(text(v)?);
                Ok(())
            },
        ),
    ]
}

fn light_descriptors() -> Vec<PropertyDescriptor> {
    let mut table = piece_descriptors();
    table.push(rw("power", ValueType::Float, |o| PropertyValue::Float(o.power), |o, v| {
        o.power = float(v)?;
        Ok(())
    }));
    table.push(rw(
        "lightColor",
        ValueType::BoxedInt,
        |o| PropertyValue::from_opt_int(o.light_color),
        |o, v| {
            o.light_color = opt_int(v)?;
            Ok(())
        },
    ));
    table
}

static PIECE_TABLE: LazyLock<Vec<PropertyDescriptor>> = LazyLock::new(piece_descriptors);
static LIGHT_TABLE: LazyLock<Vec<PropertyDescriptor>> = LazyLock::new(light_descriptors);

/// Returns the descriptor table for an object kind.
#[must_use]
pub fn descriptors(kind: ObjectKind) -> &'static [PropertyDescriptor] {
    match kind {
        ObjectKind::Piece | ObjectKind::DoorOrWindow => PIECE_TABLE.as_slice(),
        ObjectKind::Light => LIGHT_TABLE.as_slice(),
    }
}

/// Reads a property by name; properties unknown to the kind read as `Null`.
#[must_use]
pub fn get_property(object: &SceneObject, property: &str) -> PropertyValue {
    descriptors(object.kind)
        .iter()
        .find(|d| d.name == property)
        .map_or(PropertyValue::Null, |d| (d.get)(object))
}

/// Finds the mutator for `property` on `kind`, probing declared types in
/// [`ValueType::PROBE_ORDER`].
#[must_use]
pub fn resolve_setter(kind: ObjectKind, property: &str) -> Option<(ValueType, Setter)> {
    let table = descriptors(kind);
    ValueType::PROBE_ORDER.iter().find_map(|ty| {
        table
            .iter()
            .find(|d| d.name == property && d.value_type == *ty)
            .and_then(|d| d.set.map(|set| (*ty, set)))
    })
}

/// Converts text to a value of the declared type.
///
/// # Errors
///
/// - [`DispatchError::NullNotAllowed`] for `null`/blank on a non-nullable type.
/// - [`DispatchError::TypeMismatch`] if the text does not parse.
pub fn coerce(property: &str, text: &str, ty: ValueType) -> Result<PropertyValue, DispatchError> {
    if text.eq_ignore_ascii_case("null") || text.trim().is_empty() {
        return if ty.is_nullable() {
            Ok(PropertyValue::Null)
        } else {
            Err(DispatchError::NullNotAllowed {
                property: property.to_string(),
                expected: ty,
            })
        };
    }

    let mismatch = || DispatchError::TypeMismatch {
        property: property.to_string(),
        expected: ty,
        value: text.to_string(),
    };

    match ty {
        ValueType::BoxedInt | ValueType::Int => {
            let hex = text
                .strip_prefix("0x")
                .or_else(|| text.strip_prefix("0X"))
                .or_else(|| text.strip_prefix('#'));
            let parsed = match hex {
                Some(digits) => i32::from_str_radix(digits, 16),
                None => text.parse::<i32>(),
            };
            parsed.map(PropertyValue::Int).map_err(|_| mismatch())
        }
        ValueType::BoxedFloat | ValueType::Float => text
            .trim()
            .parse::<f32>()
            .map(PropertyValue::Float)
            .map_err(|_| mismatch()),
        ValueType::BoxedBool | ValueType::Bool => {
            Ok(PropertyValue::Bool(text.eq_ignore_ascii_case("true")))
        }
        ValueType::Text => Ok(PropertyValue::Text(text.to_string())),
    }
}

/// Writes a property from its textual form.
///
/// Returns the value actually stored.
///
/// # Errors
///
/// - [`DispatchError::NoSetterFound`] if the kind has no mutator for `property`.
/// - [`DispatchError::NullNotAllowed`] / [`DispatchError::TypeMismatch`] from
///   coercion or from the mutator itself.
///
/// On error the object is left untouched.
pub fn set_property(
    object: &mut SceneObject,
    property: &str,
    text: &str,
) -> Result<PropertyValue, DispatchError> {
    let Some((ty, setter)) = resolve_setter(object.kind, property) else {
        return Err(DispatchError::NoSetterFound {
            property: property.to_string(),
        });
    };
    let value = coerce(property, text, ty)?;
    setter(object, value.clone()).map_err(|MismatchedValue| DispatchError::TypeMismatch {
        property: property.to_string(),
        expected: ty,
        value: text.to_string(),
    })?;
    Ok(value)
}
