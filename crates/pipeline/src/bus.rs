//! Event publishing.
//!
//! Handlers and the RPC layer publish through [`EventPublisher`]. The
//! production [`EventBus`] appends to the durable queue and wakes the
//! dispatcher; [`RecordingPublisher`] keeps events in memory for tests.

use std::sync::Arc;

use async_trait::async_trait;
use database::{event_queue, Database};
use tokio::sync::{Mutex, Notify};

use crate::error::Result;
use crate::events::PipelineEvent;

/// Trait for emitting pipeline events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event and return its id.
    async fn publish(&self, event: PipelineEvent) -> Result<String>;
}

/// Durable event bus backed by the `events` table.
#[derive(Debug, Clone)]
pub struct EventBus {
    db: Database,
    notify: Arc<Notify>,
}

impl EventBus {
    /// Create a bus with its own wake-up signal.
    pub fn new(db: Database) -> Self {
        Self {
            db,
            notify: Arc::new(Notify::new()),
        }
    }

    /// Signal raised after every publish; the dispatcher waits on it.
    pub fn notifier(&self) -> Arc<Notify> {
        self.notify.clone()
    }

    /// Get the database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl EventPublisher for EventBus {
    async fn publish(&self, event: PipelineEvent) -> Result<String> {
        let data = event.data()?;
        let record = event_queue::enqueue(self.db.pool(), event.name(), &data).await?;

        tracing::debug!(event_id = %record.id, name = event.name(), "Published event");

        self.notify.notify_one();
        Ok(record.id)
    }
}

/// A publisher that records events in memory.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events published so far, in order.
    pub async fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: PipelineEvent) -> Result<String> {
        let mut events = self.events.lock().await;
        events.push(event);
        Ok(format!("recorded-{}", events.len()))
    }
}

/// A recording publisher whose first publishes fail.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct FlakyPublisher {
    failures_left: Mutex<u32>,
    inner: RecordingPublisher,
}

#[cfg(test)]
impl FlakyPublisher {
    pub(crate) fn failing(failures: u32) -> Self {
        Self {
            failures_left: Mutex::new(failures),
            inner: RecordingPublisher::new(),
        }
    }

    /// Events that were published successfully.
    pub(crate) async fn events(&self) -> Vec<PipelineEvent> {
        self.inner.events().await
    }
}

#[cfg(test)]
#[async_trait]
impl EventPublisher for FlakyPublisher {
    async fn publish(&self, event: PipelineEvent) -> Result<String> {
        let mut failures_left = self.failures_left.lock().await;
        if *failures_left > 0 {
            *failures_left -= 1;
            return Err(crate::error::PipelineError::ShutDown);
        }
        drop(failures_left);
        self.inner.publish(event).await
    }
}
