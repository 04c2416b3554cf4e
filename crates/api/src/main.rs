//! Tapflow API server.
//!
//! Serves the campaign, lead and outreach RPC routes plus the event webhook,
//! and runs the pipeline dispatcher in the same process.

mod config;
mod error;
mod event_key;
mod org;
mod routes;
mod state;

use std::sync::Arc;

use claude_brain::{Brain, BrainError, ClaudeBrain};
use database::Database;
use pipeline::{standard_handlers, Dispatcher, DispatcherConfig, EventBus, Providers};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting Tapflow API server");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let brain = load_brain()?;

    // Wire the pipeline
    let bus = Arc::new(EventBus::new(db.clone()));
    let mut dispatcher = Dispatcher::for_bus(
        &bus,
        DispatcherConfig::default().with_poll_interval(config.poll_interval),
    );
    for handler in standard_handlers(db.clone(), bus.clone(), Providers::sample(), brain) {
        dispatcher.register(handler);
    }

    if config.event_key.is_none() {
        warn!("TAPFLOW_EVENT_KEY not set, event webhook disabled");
    }
    let state = AppState::new(db.clone(), bus, dispatcher.handlers())
        .with_event_key(config.event_key.clone());

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let dispatcher_task = tokio::spawn(dispatcher.run_with_shutdown(async move {
        let _ = shutdown_rx.changed().await;
    }));

    // Build router
    let app = routes::router().with_state(state);

    // Start server
    info!(addr = %config.addr, "API server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Stopping pipeline dispatcher");
    let _ = shutdown_tx.send(true);
    match dispatcher_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Dispatcher stopped with error: {}", e),
        Err(e) => error!("Dispatcher task panicked: {}", e),
    }

    db.close().await;
    info!("Shutdown complete");
    Ok(())
}

/// Connect to the hosted model when it is configured.
///
/// A missing API key is not an error: scoring and content generation fall
/// back to their deterministic paths.
fn load_brain() -> Result<Option<Arc<dyn Brain>>, BrainError> {
    match ClaudeBrain::from_env() {
        Ok(brain) => {
            info!(model = %brain.config().model, "Language model enabled");
            Ok(Some(Arc::new(brain)))
        }
        Err(BrainError::Configuration(msg)) => {
            warn!("Language model disabled, using fallbacks: {}", msg);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
