//! WebSocket layer: wire codec, session state machine, connection loop.
//!
//! The WebSocket endpoint is mounted at `/`. Each connection gets one
//! [`session::Session`] driven by [`connection::run_connection`].

pub mod connection;
pub mod handler;
pub mod messages;
pub mod registry;
pub mod session;

pub use messages::{InboundAction, OutboundMessage, ParseError, WireMessage};
pub use registry::{SessionInfo, SessionRegistry};
pub use session::{Session, SessionState};
