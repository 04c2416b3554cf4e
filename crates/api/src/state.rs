//! Application state shared across handlers.

use std::sync::Arc;

use database::Database;
use pipeline::{EventPublisher, HandlerInfo};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Publisher for pipeline events.
    pub events: Arc<dyn EventPublisher>,
    /// Functions registered with the dispatcher.
    pub functions: Arc<Vec<HandlerInfo>>,
    /// Secret the event webhook requires.
    pub event_key: Option<Arc<str>>,
}

impl AppState {
    /// Create new application state.
    pub fn new(db: Database, events: Arc<dyn EventPublisher>, functions: Vec<HandlerInfo>) -> Self {
        Self {
            db,
            events,
            functions: Arc::new(functions),
            event_key: None,
        }
    }

    /// Require `key` on the event webhook.
    pub fn with_event_key(mut self, key: Option<String>) -> Self {
        self.event_key = key.map(Arc::from);
        self
    }
}
