//! Server process: owns the listening socket and its lifecycle.
//!
//! [`SyncServer::start`] binds the port and spawns the serving loop;
//! [`SyncServer::stop`] closes every session and releases the port. The
//! serving loop runs under a supervisor task: if it fails or panics, the
//! supervisor closes all sessions, releases the server and publishes
//! [`ServerStatus::Failed`] for the operator.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tokio::sync::{Mutex, oneshot, watch};
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::AppState;
use crate::config::ServerConfig;
use crate::error::SyncError;
use crate::service::SceneService;
use crate::ws::SessionRegistry;
use crate::ws::handler::ws_handler;

/// Time `stop` waits for the serving loop before aborting it.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Observable server state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerStatus {
    /// Not listening.
    Stopped,
    /// Listening on the given address.
    Running(SocketAddr),
    /// The serving loop failed; the server has released its resources.
    Failed(String),
}

/// Builds the full application: REST routes, the WebSocket endpoint at
/// `/`, tracing and CORS.
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .merge(api::build_router(request_timeout))
        .route("/", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug)]
struct Running {
    generation: u64,
    addr: SocketAddr,
    sessions: Arc<SessionRegistry>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

#[derive(Debug)]
struct Inner {
    config: ServerConfig,
    service: Arc<SceneService>,
    running: Mutex<Option<Running>>,
    status: watch::Sender<ServerStatus>,
    generation: AtomicU64,
}

/// The sync server.
///
/// Cheap to clone; clones control the same server.
#[derive(Debug, Clone)]
pub struct SyncServer {
    inner: Arc<Inner>,
}

impl SyncServer {
    /// Creates a stopped server.
    #[must_use]
    pub fn new(config: ServerConfig, service: Arc<SceneService>) -> Self {
        let (status, _) = watch::channel(ServerStatus::Stopped);
        Self {
            inner: Arc::new(Inner {
                config,
                service,
                running: Mutex::new(None),
                status,
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Returns the scene service shared by every session.
    #[must_use]
    pub fn service(&self) -> &Arc<SceneService> {
        &self.inner.service
    }

    /// Binds the configured address and starts accepting connections.
    ///
    /// Returns the bound address (useful with port `0`).
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::AlreadyRunning`] if the server is running and
    /// [`SyncError::Bind`] if the address cannot be bound; the server then
    /// stays stopped.
    pub async fn start(&self) -> Result<SocketAddr, SyncError> {
        let mut running = self.inner.running.lock().await;
        if let Some(current) = running.as_ref() {
            return Err(SyncError::AlreadyRunning(current.addr));
        }

        let requested = self.inner.config.listen_addr;
        let listener = tokio::net::TcpListener::bind(requested)
            .await
            .map_err(|source| {
                tracing::error!(addr = %requested, error = %source, "bind failed");
                SyncError::Bind {
                    addr: requested,
                    source,
                }
            })?;
        let addr = listener.local_addr().map_err(|source| SyncError::Bind {
            addr: requested,
            source,
        })?;

        let sessions = Arc::new(SessionRegistry::new());
        let state = AppState {
            service: Arc::clone(&self.inner.service),
            sessions: Arc::clone(&sessions),
            max_message_bytes: self.inner.config.max_message_bytes,
        };
        let app = build_app(state, self.inner.config.request_timeout);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let serve = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        let serving = tokio::spawn(async move { serve.await });

        let generation = self
            .inner
            .generation
            .fetch_add(1, Ordering::Relaxed)
            .wrapping_add(1);
        let supervisor = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let failure = match serving.await {
                Ok(Ok(())) => None,
                Ok(Err(err)) => Some(format!("serving loop failed: {err}")),
                Err(err) => Some(format!("serving loop crashed: {err}")),
            };
            if let Some(reason) = failure {
                supervisor.fail(generation, reason).await;
            }
        });

        *running = Some(Running {
            generation,
            addr,
            sessions,
            shutdown: Some(shutdown_tx),
            task,
        });
        self.inner.status.send_replace(ServerStatus::Running(addr));
        tracing::info!(%addr, "server listening");
        Ok(addr)
    }

    /// Closes every session and releases the listening socket.
    ///
    /// No-op when the server is not running.
    pub async fn stop(&self) {
        let Some(mut running) = self.inner.running.lock().await.take() else {
            return;
        };
        tracing::info!(addr = %running.addr, "stopping server");
        running.sessions.close_all();
        if let Some(shutdown) = running.shutdown.take() {
            let _ = shutdown.send(());
        }
        if tokio::time::timeout(STOP_TIMEOUT, &mut running.task)
            .await
            .is_err()
        {
            tracing::warn!(addr = %running.addr, "serving loop did not stop in time, aborting");
            running.task.abort();
        }
        self.inner.status.send_replace(ServerStatus::Stopped);
        tracing::info!(addr = %running.addr, "server stopped");
    }

    /// Returns `true` while the server is accepting connections.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(*self.inner.status.borrow(), ServerStatus::Running(_))
    }

    /// Returns the bound address while running.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match *self.inner.status.borrow() {
            ServerStatus::Running(addr) => Some(addr),
            _ => None,
        }
    }

    /// Watches status changes, including serving-loop failures.
    #[must_use]
    pub fn status(&self) -> watch::Receiver<ServerStatus> {
        self.inner.status.subscribe()
    }
}

impl Inner {
    /// Tears down the run identified by `generation` after a fatal
    /// serving-loop failure.
    async fn fail(&self, generation: u64, reason: String) {
        tracing::error!(reason = %reason, "fatal server failure");
        let mut running = self.running.lock().await;
        if running.as_ref().is_some_and(|r| r.generation == generation) {
            if let Some(run) = running.take() {
                run.sessions.close_all();
            }
            self.status.send_replace(ServerStatus::Failed(reason));
        }
    }
}
