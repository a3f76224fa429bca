//! Closest-object queries for click coordinates.
//!
//! The host's 3D view answers "which object is under this point". Outside
//! the host, [`FootprintPicker`] answers the same question on the plan.

use crate::domain::{ObjectId, SceneObject};

/// Resolves a point to the object under it.
pub trait ObjectPicker: Send + Sync + std::fmt::Debug {
    /// Returns the id of the closest object at `(x, y)`, if any.
    fn closest_object_at(&self, objects: &[SceneObject], x: f32, y: f32) -> Option<ObjectId>;
}

/// Plan-view picker.
///
/// Candidates are visible objects whose axis-aligned footprint
/// `[x ± width/2] × [y ± depth/2]` contains the point. The nearest centre
/// wins; on a tie the object standing higher wins.
#[derive(Debug, Default, Clone, Copy)]
pub struct FootprintPicker;

impl ObjectPicker for FootprintPicker {
    fn closest_object_at(&self, objects: &[SceneObject], x: f32, y: f32) -> Option<ObjectId> {
        objects
            .iter()
            .filter(|o| o.visible)
            .filter(|o| {
                (x - o.x).abs() <= o.width / 2.0 && (y - o.y).abs() <= o.depth / 2.0
            })
            .map(|o| {
                let distance = (x - o.x).hypot(y - o.y);
                (o, distance)
            })
            .min_by(|(a, da), (b, db)| {
                da.total_cmp(db)
                    .then_with(|| b.elevation.total_cmp(&a.elevation))
            })
            .map(|(o, _)| o.id.clone())
    }
}
