//! Registry of live sessions and the close-all signal.
//!
//! Every accepted connection registers here for as long as its loop runs.
//! [`SessionRegistry::close_all`] flips a `watch` flag that every loop
//! selects on, which is how the server stops all sessions at once.

use std::collections::HashMap;
use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::watch;

use super::session::SessionFlags;
use crate::domain::SessionId;

/// Point-in-time view of one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    /// Session identifier.
    pub id: SessionId,
    /// Peer address.
    pub remote_addr: SocketAddr,
    /// Negotiated sub-protocol, `None` in compatibility mode.
    pub protocol: Option<String>,
    /// Readiness at the time of the query.
    pub ready: bool,
    /// Accept time.
    pub connected_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Entry {
    remote_addr: SocketAddr,
    protocol: Option<String>,
    connected_at: DateTime<Utc>,
    flags: SessionFlags,
}

/// Live sessions of one running server.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Entry>>,
    shutdown: watch::Sender<bool>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            sessions: RwLock::new(HashMap::new()),
            shutdown,
        }
    }

    /// Records a newly accepted session.
    pub fn insert(
        &self,
        id: SessionId,
        remote_addr: SocketAddr,
        protocol: Option<String>,
        flags: SessionFlags,
    ) {
        self.sessions.write().insert(
            id,
            Entry {
                remote_addr,
                protocol,
                connected_at: Utc::now(),
                flags,
            },
        );
    }

    /// Forgets a session. No-op if unknown.
    pub fn remove(&self, id: SessionId) {
        self.sessions.write().remove(&id);
    }

    /// Returns a receiver that changes to `true` on [`Self::close_all`].
    #[must_use]
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Returns `true` once [`Self::close_all`] was called.
    #[must_use]
    pub fn is_closing(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Asks every session loop to close.
    pub fn close_all(&self) {
        self.shutdown.send_replace(true);
        tracing::info!(sessions = self.len(), "closing all sessions");
    }

    /// Lists live sessions, oldest first.
    #[must_use]
    pub fn list(&self) -> Vec<SessionInfo> {
        let mut sessions: Vec<SessionInfo> = self
            .sessions
            .read()
            .iter()
            .map(|(id, entry)| SessionInfo {
                id: *id,
                remote_addr: entry.remote_addr,
                protocol: entry.protocol.clone(),
                ready: entry.flags.is_ready(),
                connected_at: entry.connected_at,
            })
            .collect();
        sessions.sort_by_key(|s| s.connected_at);
        sessions
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Returns `true` if no session is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
