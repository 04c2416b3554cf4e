//! Event-driven lead pipeline for Tapflow.
//!
//! A new campaign flows through four handlers, each triggered by the event the
//! previous one publishes:
//!
//! ```text
//! campaign/created  -> discovery-agent  -> prospect/found
//! prospect/found    -> enrichment-agent -> prospect/enriched
//! prospect/enriched -> scoring-agent    -> prospect/scored (tiers A/B only)
//! prospect/scored   -> content-agent    -> outreach/generated
//! ```
//!
//! Events are persisted in the `events` table by the [`EventBus`] and run by
//! the [`Dispatcher`], which enforces per-handler concurrency caps and retries.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use database::Database;
//! use pipeline::{standard_handlers, Dispatcher, DispatcherConfig, EventBus, Providers};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:tapflow.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let bus = Arc::new(EventBus::new(db.clone()));
//!     let mut dispatcher = Dispatcher::for_bus(&bus, DispatcherConfig::default());
//!     for handler in standard_handlers(db, bus.clone(), Providers::sample(), None) {
//!         dispatcher.register(handler);
//!     }
//!
//!     dispatcher.run_with_shutdown(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!     Ok(())
//! }
//! ```

pub mod bus;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod handler;
pub mod handlers;
pub mod providers;

pub use bus::{EventBus, EventPublisher, RecordingPublisher};
pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use error::{PipelineError, Result};
pub use events::PipelineEvent;
pub use handler::{EventHandler, HandlerInfo, DEFAULT_RETRIES};
pub use handlers::standard_handlers;
pub use providers::Providers;
