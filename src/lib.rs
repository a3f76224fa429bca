//! # scratchomised-server
//!
//! WebSocket bridge keeping Scratch clients in sync with a live 3D home
//! scene.
//!
//! Clients connect to `/`, say `client_ready`, and from then on receive a
//! full filtered snapshot (`update_objects`) after every scene change. They
//! write properties with `define_property`, and every connected client,
//! ready or not, hears about switch clicks through `object_clicked`.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket, operator HTTP)
//!     │
//!     ├── WS Handler + Session state machine (ws/)
//!     ├── REST Handlers (api/)
//!     │
//!     ├── SceneService, snapshot filter, picker (service/)
//!     ├── SceneEventBus, ClickHub (domain/)
//!     │
//!     ├── SceneGraph + property dispatch tables (domain/)
//!     │
//!     └── JSON scene seed (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod server;
pub mod service;
pub mod ws;
