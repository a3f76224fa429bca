//! REST endpoint handlers organized by resource.

pub mod clicks;
pub mod objects;
pub mod sessions;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(objects::routes())
        .merge(clicks::routes())
        .merge(sessions::routes())
}
