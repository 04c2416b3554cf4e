//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use database::event_queue;
use serde::Serialize;

use crate::error::Result;
use crate::state::AppState;

#[derive(Serialize)]
pub struct Health {
    pub status: String,
    /// Events waiting for the dispatcher.
    pub pending_events: i64,
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Result<Json<Health>> {
    let pending_events = event_queue::pending_count(state.db.pool()).await?;
    Ok(Json(Health {
        status: "ok".to_string(),
        pending_events,
    }))
}
