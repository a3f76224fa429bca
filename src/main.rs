//! scratchomised-server entry point.
//!
//! Loads the scene seed, starts the sync server and runs until Ctrl-C or a
//! fatal serving-loop failure.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use scratchomised_server::config::{LogFormat, ServerConfig};
use scratchomised_server::domain::{ClickHub, SceneEventBus, SceneGraph};
use scratchomised_server::persistence::load_scene;
use scratchomised_server::server::{ServerStatus, SyncServer};
use scratchomised_server::service::SceneService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServerConfig::from_env()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting scratchomised-server");

    // Build domain layer
    let objects = match &config.scene_file {
        Some(path) => load_scene(path)
            .await
            .with_context(|| format!("loading scene from {}", path.display()))?,
        None => Vec::new(),
    };
    let scene = Arc::new(SceneGraph::with_objects(objects));
    let events = SceneEventBus::new(config.scene_event_capacity);
    let hub = ClickHub::new();

    // Build service layer
    let service = Arc::new(SceneService::new(scene, events, hub));

    // Start server
    let server = SyncServer::new(config, service);
    let mut status = server.status();
    server.start().await.context("starting server")?;

    let outcome = tokio::select! {
        signal = tokio::signal::ctrl_c() => signal.context("waiting for Ctrl-C"),
        failure = wait_for_failure(&mut status) => Err(anyhow::anyhow!(failure)),
    };

    server.stop().await;
    outcome
}

/// Resolves with the reason once the server reports a fatal failure.
async fn wait_for_failure(status: &mut tokio::sync::watch::Receiver<ServerStatus>) -> String {
    loop {
        if let ServerStatus::Failed(reason) = &*status.borrow_and_update() {
            return reason.clone();
        }
        if status.changed().await.is_err() {
            return "server status channel closed".to_string();
        }
    }
}
