//! Scene service: orchestrates scene reads and mutations and emits events.

use std::sync::Arc;

use crate::domain::properties::{get_property, resolve_setter, set_property};
use crate::domain::{
    ClickHub, ObjectId, PropertyValue, SceneEvent, SceneEventBus, SceneGraph, SceneObject,
    SceneSubscription,
};
use crate::error::SyncError;
use crate::service::picking::{FootprintPicker, ObjectPicker};
use crate::service::snapshot::{ObjectProjection, build_snapshot, is_switch};

/// Property toggled by a click on a switch.
const POWER: &str = "power";

/// Result of handling one click.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Nothing under the point, or the object is not a switch.
    Ignored,
    /// A switch was clicked and the click was broadcast.
    Switched {
        /// Clicked object.
        object_id: ObjectId,
        /// New power value, if the object has one.
        power: Option<PropertyValue>,
        /// Number of click subscribers notified.
        notified: usize,
    },
}

/// Orchestration layer for all scene operations.
///
/// Owns references to the [`SceneGraph`] for state, the [`SceneEventBus`]
/// for change notifications and the [`ClickHub`] for click fan-out. Every
/// mutation follows the pattern: acquire write lock → mutate → release →
/// publish event → return result.
#[derive(Debug, Clone)]
pub struct SceneService {
    scene: Arc<SceneGraph>,
    events: SceneEventBus,
    hub: ClickHub,
    picker: Arc<dyn ObjectPicker>,
}

impl SceneService {
    /// Creates a new `SceneService` using the plan footprint picker.
    #[must_use]
    pub fn new(scene: Arc<SceneGraph>, events: SceneEventBus, hub: ClickHub) -> Self {
        Self {
            scene,
            events,
            hub,
            picker: Arc::new(FootprintPicker),
        }
    }

    /// Replaces the picker used by [`SceneService::click_at`].
    #[must_use]
    pub fn with_picker(mut self, picker: Arc<dyn ObjectPicker>) -> Self {
        self.picker = picker;
        self
    }

    /// Returns the scene store.
    #[must_use]
    pub fn scene(&self) -> &Arc<SceneGraph> {
        &self.scene
    }

    /// Returns the click hub.
    #[must_use]
    pub fn hub(&self) -> &ClickHub {
        &self.hub
    }

    /// Returns the scene-change event bus.
    #[must_use]
    pub fn events(&self) -> &SceneEventBus {
        &self.events
    }

    /// Subscribes to scene-change notifications for every current and
    /// future object.
    #[must_use]
    pub fn subscribe(&self) -> SceneSubscription {
        self.events.subscribe()
    }

    /// Builds a full filtered snapshot under the read lock.
    pub async fn snapshot(&self) -> Vec<ObjectProjection> {
        self.scene.read(build_snapshot).await
    }

    /// Adds an object and notifies subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidRequest`] if the id is already taken.
    pub async fn add_object(&self, object: SceneObject) -> Result<ObjectId, SyncError> {
        let object_id = self.scene.insert(object).await?;
        let _ = self.events.publish(SceneEvent::added(object_id.clone()));
        tracing::info!(%object_id, "object added");
        Ok(object_id)
    }

    /// Writes a property from its textual form and notifies subscribers.
    ///
    /// Returns the value actually stored.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ObjectNotFound`] for an unknown object and
    /// [`SyncError::Dispatch`] when the dispatch engine rejects the write;
    /// in both cases nothing is mutated and no event is emitted.
    pub async fn define_property(
        &self,
        object_id: &ObjectId,
        property: &str,
        value: &str,
    ) -> Result<PropertyValue, SyncError> {
        let stored = self
            .scene
            .update(object_id, |object| set_property(object, property, value))
            .await??;

        let _ = self
            .events
            .publish(SceneEvent::property_changed(object_id.clone(), property));
        tracing::info!(%object_id, property, value = %stored, "property set");
        Ok(stored)
    }

    /// Handles a click on an object.
    ///
    /// A switch gets its power toggled between `0` and `1` (when it has a
    /// power property) and the click is broadcast on the hub. Any other
    /// object is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ObjectNotFound`] for an unknown object.
    pub async fn click(&self, object_id: &ObjectId) -> Result<ClickOutcome, SyncError> {
        // Outer `None`: not a switch. Inner `None`: no power to toggle.
        let toggled = self
            .scene
            .update(object_id, |object| {
                if !is_switch(object) {
                    return None;
                }
                if resolve_setter(object.kind, POWER).is_none() {
                    return Some(None);
                }
                let off = get_property(object, POWER)
                    .as_f64()
                    .is_none_or(|current| current == 0.0);
                let next = if off { "1" } else { "0" };
                match set_property(object, POWER, next) {
                    Ok(value) => Some(Some(value)),
                    Err(err) => {
                        tracing::warn!(object_id = %object.id, error = %err, "cannot toggle power");
                        Some(None)
                    }
                }
            })
            .await?;

        let Some(power) = toggled else {
            tracing::debug!(%object_id, "click ignored, not a switch");
            return Ok(ClickOutcome::Ignored);
        };

        if power.is_some() {
            let _ = self
                .events
                .publish(SceneEvent::property_changed(object_id.clone(), POWER));
        }
        let notified = self.hub.publish(object_id);
        tracing::info!(%object_id, ?power, notified, "switch clicked");
        Ok(ClickOutcome::Switched {
            object_id: object_id.clone(),
            power,
            notified,
        })
    }

    /// Handles a click at plan coordinates, picking the closest object.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`SceneService::click`].
    pub async fn click_at(&self, x: f32, y: f32) -> Result<ClickOutcome, SyncError> {
        let picked = self
            .scene
            .read(|objects| self.picker.closest_object_at(objects, x, y))
            .await;
        match picked {
            Some(object_id) => self.click(&object_id).await,
            None => {
                tracing::debug!(x, y, "click hit no object");
                Ok(ClickOutcome::Ignored)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::{ObjectKind, SubscriberError};

    fn service(objects: Vec<SceneObject>) -> SceneService {
        SceneService::new(
            Arc::new(SceneGraph::with_objects(objects)),
            SceneEventBus::new(64),
            ClickHub::new(),
        )
    }

    fn switch_light(id: &str) -> SceneObject {
        SceneObject::new(ObjectId::from(id), "Wall", ObjectKind::Light)
            .with_catalog_id("Scopia#square-switch")
    }

    #[tokio::test]
    async fn define_property_publishes_change() {
        let svc = service(vec![switch_light("s")]);
        let mut events = svc.subscribe();

        let result = svc
            .define_property(&ObjectId::from("s"), "color", "#FF0000")
            .await;
        assert!(matches!(result, Ok(PropertyValue::Int(16_711_680))));

        let Ok(event) = events.recv().await else {
            panic!("expected a change event");
        };
        assert_eq!(event.event_type_str(), "property_changed");
    }

    #[tokio::test]
    async fn rejected_write_emits_nothing() {
        let svc = service(vec![switch_light("s")]);
        let mut events = svc.subscribe();
        let result = svc
            .define_property(&ObjectId::from("s"), "texture", "null")
            .await;
        assert!(matches!(result, Err(SyncError::Dispatch(_))));

        svc.events().publish(SceneEvent::added(ObjectId::from("probe")));
        let Ok(event) = events.recv().await else {
            panic!("expected the probe event");
        };
        assert_eq!(event.object_id().as_str(), "probe");
    }

    #[tokio::test]
    async fn define_property_on_unknown_object() {
        let svc = service(vec![]);
        let result = svc.define_property(&ObjectId::from("ghost"), "x", "1").await;
        assert!(matches!(result, Err(SyncError::ObjectNotFound(_))));
    }

    #[tokio::test]
    async fn click_toggles_power_and_broadcasts() {
        let mut obj = switch_light("s");
        obj.power = 0.0;
        let svc = service(vec![obj]);
        let clicks = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&clicks);
        svc.hub()
            .register(Arc::new(move |id: &ObjectId| -> Result<(), SubscriberError> {
                if let Ok(mut guard) = sink.lock() {
                    guard.push(id.clone());
                }
                Ok(())
            }));

        let Ok(first) = svc.click(&ObjectId::from("s")).await else {
            panic!("click failed");
        };
        assert!(matches!(
            first,
            ClickOutcome::Switched { power: Some(PropertyValue::Float(p)), notified: 1, .. } if p == 1.0
        ));

        let Ok(second) = svc.click(&ObjectId::from("s")).await else {
            panic!("click failed");
        };
        assert!(matches!(
            second,
            ClickOutcome::Switched { power: Some(PropertyValue::Float(p)), .. } if p == 0.0
        ));
        assert_eq!(clicks.lock().map(|g| g.len()).unwrap_or_default(), 2);
    }

    #[tokio::test]
    async fn switch_without_power_still_broadcasts() {
        let plate = SceneObject::new(ObjectId::from("p"), "Interrupteur", ObjectKind::Piece);
        let svc = service(vec![plate]);
        let Ok(outcome) = svc.click(&ObjectId::from("p")).await else {
            panic!("click failed");
        };
        assert_eq!(
            outcome,
            ClickOutcome::Switched {
                object_id: ObjectId::from("p"),
                power: None,
                notified: 0,
            }
        );
    }

    #[tokio::test]
    async fn lamp_click_is_ignored() {
        let lamp = SceneObject::new(ObjectId::from("l"), "Lamp", ObjectKind::Light);
        let svc = service(vec![lamp]);
        let Ok(outcome) = svc.click(&ObjectId::from("l")).await else {
            panic!("click failed");
        };
        assert_eq!(outcome, ClickOutcome::Ignored);
        let Ok(lamp) = svc.scene().get(&ObjectId::from("l")).await else {
            panic!("lamp must exist");
        };
        assert!((lamp.power - 0.5).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn click_at_uses_picker() {
        let svc = service(vec![switch_light("s").at(100.0, 100.0)]);
        let Ok(hit) = svc.click_at(110.0, 90.0).await else {
            panic!("click failed");
        };
        assert!(matches!(hit, ClickOutcome::Switched { .. }));
        let Ok(miss) = svc.click_at(-500.0, -500.0).await else {
            panic!("click failed");
        };
        assert_eq!(miss, ClickOutcome::Ignored);
    }

    #[tokio::test]
    async fn add_object_appears_in_snapshot() {
        let svc = service(vec![]);
        let lamp = SceneObject::new(ObjectId::from("l"), "Lamp", ObjectKind::Light);
        assert!(svc.add_object(lamp).await.is_ok());
        let sofa = SceneObject::new(ObjectId::from("s"), "Sofa", ObjectKind::Piece);
        assert!(svc.add_object(sofa).await.is_ok());
        let snapshot = svc.snapshot().await;
        assert_eq!(snapshot.len(), 1);
    }
}
