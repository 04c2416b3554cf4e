//! The event handler trait.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::events::PipelineEvent;

/// Default number of retries after a failed run.
pub const DEFAULT_RETRIES: u32 = 3;

/// A function run by the dispatcher for every event matching its trigger.
///
/// Handlers are stateless between runs; all coordination goes through the
/// store and the bus.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Stable handler id, e.g. `scoring-agent`.
    fn id(&self) -> &'static str;

    /// Name of the event that triggers this handler.
    fn trigger(&self) -> &'static str;

    /// Maximum concurrent runs.
    fn concurrency(&self) -> usize;

    /// Retries after the first failed attempt.
    fn retries(&self) -> u32 {
        DEFAULT_RETRIES
    }

    /// Handle one event and return a JSON summary of the run.
    async fn handle(&self, event: &PipelineEvent) -> Result<Value>;
}

/// Registration details of a handler, as listed by the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerInfo {
    pub id: &'static str,
    pub trigger: &'static str,
    pub concurrency: usize,
    pub retries: u32,
}

impl HandlerInfo {
    pub fn of(handler: &dyn EventHandler) -> Self {
        Self {
            id: handler.id(),
            trigger: handler.trigger(),
            concurrency: handler.concurrency(),
            retries: handler.retries(),
        }
    }
}
