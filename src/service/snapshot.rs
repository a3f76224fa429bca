//! Object filtering and snapshot projection.
//!
//! Clients only care about lighting: lights, lamps and switches. An object
//! qualifies if its type tags, catalog id or name mention one of those
//! terms. Each qualifying object is projected to a flat map carrying the
//! same fixed property set for every object, absent values as `null`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::properties::get_property;
use crate::domain::{ObjectId, PropertyValue, SceneObject};

/// Key under which the type tags are projected, namespaced so that it
/// cannot collide with a scene property.
pub const CLASSES_KEY: &str = "__scratchomisedClasses";

/// Properties included in every projection, in wire naming.
pub const SNAPSHOT_PROPERTIES: [&str; 15] = [
    "x",
    "y",
    "z",
    "angle",
    "width",
    "depth",
    "height",
    "visible",
    "locked",
    "model",
    "color",
    "texture",
    "shininess",
    "power",
    "lightColor",
];

const INTEREST_TERMS: [&str; 3] = ["light", "lamp", "switch"];
const LOCALIZED_SWITCH: &str = "interrupteur";

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let lower = haystack.to_lowercase();
    needles.iter().any(|n| lower.contains(n))
}

/// Returns `true` if clients should see this object.
#[must_use]
pub fn is_of_interest(object: &SceneObject) -> bool {
    if object
        .specific_type_tags()
        .any(|tag| contains_any(tag, &INTEREST_TERMS))
    {
        return true;
    }
    if object
        .catalog_id
        .as_deref()
        .is_some_and(|c| contains_any(c, &INTEREST_TERMS))
    {
        return true;
    }
    contains_any(&object.name, &INTEREST_TERMS) || contains_any(&object.name, &[LOCALIZED_SWITCH])
}

/// Returns `true` if a click on this object toggles it.
///
/// Narrower than [`is_of_interest`]: lights and lamps alone do not count.
#[must_use]
pub fn is_switch(object: &SceneObject) -> bool {
    const SWITCH_TERMS: [&str; 2] = ["switch", LOCALIZED_SWITCH];
    object
        .catalog_id
        .as_deref()
        .is_some_and(|c| contains_any(c, &SWITCH_TERMS))
        || contains_any(&object.name, &SWITCH_TERMS)
}

/// Lightweight client-side view of one scene object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectProjection {
    /// Object identifier.
    pub id: ObjectId,
    /// Display name.
    pub name: String,
    /// Type hierarchy, most specific first.
    #[serde(rename = "__scratchomisedClasses")]
    pub classes: Vec<String>,
    /// The [`SNAPSHOT_PROPERTIES`], each present, `null` when absent.
    #[serde(flatten)]
    pub properties: BTreeMap<&'static str, PropertyValue>,
}

impl ObjectProjection {
    /// Projects one object.
    #[must_use]
    pub fn from_object(object: &SceneObject) -> Self {
        let properties = SNAPSHOT_PROPERTIES
            .iter()
            .map(|name| (*name, get_property(object, name)))
            .collect();
        Self {
            id: object.id.clone(),
            name: object.name.clone(),
            classes: object.specific_type_tags().map(str::to_string).collect(),
            properties,
        }
    }
}

/// Builds a full snapshot of all qualifying objects, in scene order.
#[must_use]
pub fn build_snapshot(objects: &[SceneObject]) -> Vec<ObjectProjection> {
    let snapshot: Vec<ObjectProjection> = objects
        .iter()
        .filter(|o| is_of_interest(o))
        .map(ObjectProjection::from_object)
        .collect();
    tracing::debug!(
        total = objects.len(),
        filtered = snapshot.len(),
        "snapshot built"
    );
    snapshot
}
