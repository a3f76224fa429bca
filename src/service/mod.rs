//! Service layer: business logic orchestration.
//!
//! [`SceneService`] coordinates scene reads and writes, drives the
//! property dispatch engine, and emits events through the
//! [`super::domain::SceneEventBus`] and [`super::domain::ClickHub`].

pub mod picking;
pub mod scene_service;
pub mod snapshot;

pub use picking::{FootprintPicker, ObjectPicker};
pub use scene_service::{ClickOutcome, SceneService};
pub use snapshot::{ObjectProjection, build_snapshot, is_of_interest, is_switch};
