//! Persistence layer: JSON scene seed.
//!
//! Session state is never persisted; only the initial scene is read from
//! disk, through [`scene_file::load_scene`].

pub mod models;
pub mod scene_file;

pub use models::ObjectRecord;
pub use scene_file::{load_scene, parse_scene};
