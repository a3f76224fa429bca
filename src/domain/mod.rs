//! Domain layer: scene model, property dispatch, and event fan-out.
//!
//! This module holds the server-side model of the host scene: object
//! identity and typed properties, the descriptor tables used to read and
//! write properties by name, the lock-protected scene store, the
//! scene-change event bus, and the click notification hub.

pub mod click_hub;
pub mod event_bus;
pub mod ids;
pub mod properties;
pub mod scene_event;
pub mod scene_graph;
pub mod scene_object;

pub use click_hub::{ClickCallback, ClickHub, SubscriberError, SubscriptionId};
pub use event_bus::{SceneEventBus, SceneSubscription};
pub use ids::{ObjectId, SessionId};
pub use properties::DispatchError;
pub use scene_event::SceneEvent;
pub use scene_graph::SceneGraph;
pub use scene_object::{ObjectKind, PropertyValue, SceneObject};
