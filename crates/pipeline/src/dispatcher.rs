//! Event dispatcher: claims queued events and runs the matching handlers.

use std::sync::Arc;
use std::time::Duration;

use database::{event_queue, Database, EventRecord};
use futures::future::join_all;
use serde_json::Value;
use tokio::sync::{Notify, Semaphore};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::bus::EventBus;
use crate::error::{PipelineError, Result};
use crate::events::PipelineEvent;
use crate::handler::{EventHandler, HandlerInfo};

/// Default fallback poll interval when no publish wakes the dispatcher.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Default pause between attempts of a failing handler.
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Default number of events claimed per batch.
const DEFAULT_BATCH_SIZE: i64 = 50;

/// Configuration for the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// How long to wait for a publish before polling the queue anyway.
    pub poll_interval: Duration,

    /// Fixed pause between attempts of a failing handler.
    pub retry_backoff: Duration,

    /// Maximum events claimed at once.
    pub batch_size: i64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl DispatcherConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }
}

struct Registered {
    handler: Arc<dyn EventHandler>,
    permits: Arc<Semaphore>,
}

/// Outcome of one handler's run over one event.
struct RunOutcome {
    handler: &'static str,
    attempts: i64,
    result: std::result::Result<Value, String>,
}

/// Runs registered handlers against the durable event queue.
///
/// Each handler gets its own semaphore sized to its concurrency cap. A failed
/// run is retried up to the handler's retry count; after the last attempt the
/// event is marked failed with the final error.
pub struct Dispatcher {
    db: Database,
    notify: Arc<Notify>,
    handlers: Vec<Registered>,
    config: DispatcherConfig,
}

impl Dispatcher {
    /// Create a dispatcher with no handlers.
    pub fn new(db: Database, notify: Arc<Notify>, config: DispatcherConfig) -> Self {
        Self {
            db,
            notify,
            handlers: Vec::new(),
            config,
        }
    }

    /// Create a dispatcher woken by the given bus.
    pub fn for_bus(bus: &EventBus, config: DispatcherConfig) -> Self {
        Self::new(bus.database().clone(), bus.notifier(), config)
    }

    /// Register a handler.
    pub fn register(&mut self, handler: Arc<dyn EventHandler>) {
        info!(
            "Registered function {} on {} (concurrency {}, retries {})",
            handler.id(),
            handler.trigger(),
            handler.concurrency(),
            handler.retries()
        );
        let permits = Arc::new(Semaphore::new(handler.concurrency().max(1)));
        self.handlers.push(Registered { handler, permits });
    }

    /// Register a handler, builder style.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.register(handler);
        self
    }

    /// Registration details of every handler.
    pub fn handlers(&self) -> Vec<HandlerInfo> {
        self.handlers
            .iter()
            .map(|r| HandlerInfo::of(r.handler.as_ref()))
            .collect()
    }

    /// Put events left `running` by a previous process back in the queue.
    pub async fn recover(&self) -> Result<u64> {
        Ok(event_queue::requeue_running(self.db.pool()).await?)
    }

    /// Claim one batch of pending events and process it to completion.
    ///
    /// Returns the number of events claimed.
    pub async fn dispatch_pending(&self) -> Result<usize> {
        let batch = event_queue::claim_pending(self.db.pool(), self.config.batch_size).await?;
        let claimed = batch.len();

        if claimed > 0 {
            debug!("Claimed {} events", claimed);
        }

        let results = join_all(batch.into_iter().map(|record| self.process(record))).await;
        for result in results {
            if let Err(e) = result {
                error!("Failed to settle event: {}", e);
            }
        }

        Ok(claimed)
    }

    /// Dispatch until the queue is empty, including events emitted along the way.
    ///
    /// Returns the total number of events processed.
    pub async fn run_until_idle(&self) -> Result<usize> {
        let mut total = 0;
        loop {
            let claimed = self.dispatch_pending().await?;
            if claimed == 0 {
                return Ok(total);
            }
            total += claimed;
        }
    }

    /// Run the dispatcher until the shutdown signal completes.
    ///
    /// The batch in flight when the signal arrives is finished first.
    pub async fn run_with_shutdown<S>(self, shutdown_signal: S) -> Result<()>
    where
        S: std::future::Future<Output = ()> + Send,
    {
        info!(
            "Starting pipeline dispatcher with {} functions",
            self.handlers.len()
        );

        let recovered = self.recover().await?;
        if recovered > 0 {
            warn!("Requeued {} events left running by a previous process", recovered);
        }

        tokio::pin!(shutdown_signal);

        loop {
            let full_batch = match self.dispatch_pending().await {
                Ok(claimed) => claimed as i64 >= self.config.batch_size,
                Err(e) => {
                    error!("Dispatch failed: {}", e);
                    false
                }
            };

            if full_batch {
                continue;
            }

            tokio::select! {
                biased;

                () = &mut shutdown_signal => {
                    info!("Shutdown signal received, stopping dispatcher");
                    return Ok(());
                }

                _ = self.notify.notified() => {}

                _ = sleep(self.config.poll_interval) => {}
            }
        }
    }

    async fn process(&self, record: EventRecord) -> Result<()> {
        let pool = self.db.pool();

        let event = match PipelineEvent::from_parts(&record.name, record.payload.0.clone()) {
            Ok(event) => event,
            Err(e) => {
                error!("Event {} ({}) is malformed: {}", record.id, record.name, e);
                event_queue::mark_failed(pool, &record.id, 0, &e.to_string()).await?;
                return Ok(());
            }
        };

        let matching: Vec<&Registered> = self
            .handlers
            .iter()
            .filter(|r| r.handler.trigger() == event.name())
            .collect();

        if matching.is_empty() {
            debug!("No functions registered for {}, settling {}", event.name(), record.id);
            event_queue::mark_completed(pool, &record.id, 0).await?;
            return Ok(());
        }

        let outcomes = join_all(matching.into_iter().map(|r| self.run_handler(r, &event))).await;

        let attempts = outcomes.iter().map(|o| o.attempts).sum();
        let failure = outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| format!("{}: {}", o.handler, e)))
            .last();

        match failure {
            Some(error) => event_queue::mark_failed(pool, &record.id, attempts, &error).await?,
            None => event_queue::mark_completed(pool, &record.id, attempts).await?,
        }

        Ok(())
    }

    async fn run_handler(&self, registered: &Registered, event: &PipelineEvent) -> RunOutcome {
        let handler = registered.handler.as_ref();
        let max_attempts = handler.retries() + 1;
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            let result = match registered.permits.acquire().await {
                Ok(_permit) => handler.handle(event).await,
                Err(_) => Err(PipelineError::ShutDown),
            };

            match result {
                Ok(output) => {
                    info!(
                        "Function {} completed {} (attempt {})",
                        handler.id(),
                        event.name(),
                        attempt
                    );
                    debug!("Function {} output: {}", handler.id(), output);
                    return RunOutcome {
                        handler: handler.id(),
                        attempts: i64::from(attempt),
                        result: Ok(output),
                    };
                }
                Err(e) => {
                    last_error = e.to_string();
                    if attempt < max_attempts {
                        warn!(
                            "Function {} failed on {} (attempt {}/{}): {}; retrying",
                            handler.id(),
                            event.name(),
                            attempt,
                            max_attempts,
                            e
                        );
                        sleep(self.config.retry_backoff).await;
                    } else {
                        error!(
                            "Function {} failed on {} after {} attempts: {}",
                            handler.id(),
                            event.name(),
                            max_attempts,
                            e
                        );
                    }
                }
            }
        }

        RunOutcome {
            handler: handler.id(),
            attempts: i64::from(max_attempts),
            result: Err(last_error),
        }
    }
}
