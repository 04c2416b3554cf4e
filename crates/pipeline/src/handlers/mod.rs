//! The four pipeline handlers.
//!
//! Each handler fetches its rows, calls a provider (or its deterministic
//! fallback), persists the result and publishes the next event.

mod content;
mod discovery;
mod enrichment;
mod scoring;

use std::sync::Arc;

use brain_core::Brain;
use database::Database;

use crate::bus::EventPublisher;
use crate::handler::EventHandler;
use crate::providers::Providers;

pub use content::{ContentHandler, EmailDraft};
pub use discovery::DiscoveryHandler;
pub use enrichment::EnrichmentHandler;
pub use scoring::{fallback_score, ScoreResult, ScoringHandler};

/// Build the discovery, enrichment, scoring and content handlers.
///
/// Without a brain, scoring and content use their deterministic fallbacks.
pub fn standard_handlers(
    db: Database,
    publisher: Arc<dyn EventPublisher>,
    providers: Providers,
    brain: Option<Arc<dyn Brain>>,
) -> Vec<Arc<dyn EventHandler>> {
    vec![
        Arc::new(DiscoveryHandler::new(
            db.clone(),
            publisher.clone(),
            providers.directories.clone(),
        )),
        Arc::new(EnrichmentHandler::new(
            db.clone(),
            publisher.clone(),
            providers.contacts.clone(),
            providers.tech_stack.clone(),
        )),
        Arc::new(ScoringHandler::new(db.clone(), publisher.clone(), brain.clone())),
        Arc::new(ContentHandler::new(db, publisher, brain)),
    ]
}
