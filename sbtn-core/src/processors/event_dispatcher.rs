//! EventDispatcher.
//!
//! The EventDispatcher is responsible for:
//! - Holding the event type to listener registry, filled once at startup
//! - `dispatch`: validating an event, recording it in the event store and
//!   handing it to the push queue for asynchronous delivery
//! - `publish`: fanning a delivered event out to every subscribed listener
//!   concurrently, isolating listener failures from each other
//!
//! Publish is invoked by the consume endpoint when the push queue delivers a
//! task created by dispatch. Delivery is at-least-once, so listeners must
//! tolerate seeing the same event id twice.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use sbtn_sdk::objects::{Envelope, EnvelopeError, JSON_CONTENT_TYPE};
use sbtn_sdk::signature::{SIGNATURE_HEADER, sign_body};
use thiserror::Error;
use tracing::{Instrument, error, info, warn};
use url::Url;

use crate::queue::{PushQueue, QueueError, Task};
use crate::repositories::EventRepository;

/// A side-effect handler subscribed to one or more event types.
///
/// Listeners run concurrently with each other and may see the same event
/// more than once. They must be idempotent.
#[async_trait]
pub trait EventListener: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    async fn handle(&self, event: &Envelope) -> anyhow::Result<()>;
}

/// Errors that can occur while dispatching an event.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The event failed validation; nothing was stored or enqueued
    #[error(transparent)]
    Invalid(#[from] EnvelopeError),

    /// The event could not be serialized into a task body
    #[error("cannot serialize event: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The push queue did not accept the task
    #[error("cannot enqueue event: {0}")]
    Queue(#[from] QueueError),
}

/// Outcome of a publish, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishSummary {
    pub succeeded: usize,
    /// Names of the listeners that returned an error or panicked.
    pub failed: Vec<String>,
}

pub struct EventDispatcher {
    listeners: HashMap<String, Vec<Arc<dyn EventListener>>>,
    repository: Arc<dyn EventRepository>,
    queue: Arc<dyn PushQueue>,
    consumer_url: Url,
    signing_secret: Option<Vec<u8>>,
}

impl EventDispatcher {
    /// Create a dispatcher with an empty listener registry.
    ///
    /// # Arguments
    ///
    /// * `repository` - Event store written on every dispatch
    /// * `queue` - Push queue that delivers dispatched events
    /// * `consumer_url` - URL the queue delivers to, i.e. the consume endpoint
    pub fn new(
        repository: Arc<dyn EventRepository>,
        queue: Arc<dyn PushQueue>,
        consumer_url: Url,
    ) -> Self {
        Self {
            listeners: HashMap::new(),
            repository,
            queue,
            consumer_url,
            signing_secret: None,
        }
    }

    /// Sign every task body so the consume endpoint can authenticate deliveries.
    pub fn with_signing_secret(mut self, secret: impl Into<Vec<u8>>) -> Self {
        self.signing_secret = Some(secret.into());
        self
    }

    /// Register a listener for an event type. Registration order is kept, but
    /// listeners of the same type run concurrently.
    pub fn subscribe(&mut self, event_type: impl Into<String>, listener: Arc<dyn EventListener>) {
        self.listeners
            .entry(event_type.into())
            .or_default()
            .push(listener);
    }

    pub fn subscribe_all<I, S>(&mut self, subscriptions: I)
    where
        I: IntoIterator<Item = (S, Arc<dyn EventListener>)>,
        S: Into<String>,
    {
        for (event_type, listener) in subscriptions {
            self.subscribe(event_type, listener);
        }
    }

    pub fn listener_count(&self, event_type: &str) -> usize {
        self.listeners.get(event_type).map_or(0, Vec::len)
    }

    /// Event types with at least one listener, sorted.
    pub fn subscribed_event_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self
            .listeners
            .iter()
            .filter(|(_, listeners)| !listeners.is_empty())
            .map(|(event_type, _)| event_type.as_str())
            .collect();
        types.sort_unstable();
        types
    }

    /// Validate, record and enqueue an event. Returns the queue task id.
    ///
    /// A failure to record the event is logged and does not stop the enqueue.
    #[tracing::instrument(skip_all, err, fields(event_id = %event.id, event_type = %event.event_type))]
    pub async fn dispatch(&self, event: &Envelope) -> Result<String, DispatchError> {
        event.validate()?;

        if let Err(e) = self.repository.save(event).await {
            error!(error = %e, "Failed to store event");
        }

        let task = self.build_task(event)?;
        let task_id = self.queue.enqueue(task).await?;

        info!(task_id = %task_id, "Event enqueued");
        Ok(task_id)
    }

    /// Dispatch and log a failure instead of returning it.
    ///
    /// For producers whose own operation has already succeeded and must not
    /// fail because its notification could not be sent.
    pub async fn dispatch_best_effort(&self, event: &Envelope) {
        if let Err(e) = self.dispatch(event).await {
            warn!(
                event_id = %event.id,
                event_type = %event.event_type,
                error = %e,
                "Event dispatch failed"
            );
        }
    }

    fn build_task(&self, event: &Envelope) -> Result<Task, serde_json::Error> {
        let body = serde_json::to_vec(event)?;
        let mut task = Task::new(Method::POST, self.consumer_url.clone(), Vec::new())
            .with_header("Content-Type", JSON_CONTENT_TYPE);
        if let Some(secret) = &self.signing_secret {
            task = task.with_header(SIGNATURE_HEADER, sign_body(&body, secret));
        }
        task.body = body;
        Ok(task)
    }

    /// Deliver an event to every listener subscribed to its type.
    ///
    /// Listeners run concurrently and all of them run to completion, even if
    /// the caller stops awaiting this future. A failing or panicking listener
    /// is logged and never affects the others.
    #[tracing::instrument(skip_all, fields(event_id = %event.id, event_type = %event.event_type))]
    pub async fn publish(&self, event: Envelope) -> PublishSummary {
        let Some(listeners) = self
            .listeners
            .get(&event.event_type)
            .filter(|listeners| !listeners.is_empty())
        else {
            info!("No listener is configured for event type");
            return PublishSummary::default();
        };

        let event = Arc::new(event);
        // Detached: dropping a JoinHandle does not abort its task.
        let handles: Vec<_> = listeners
            .iter()
            .map(|listener| {
                let name = listener.name().to_string();
                let listener = Arc::clone(listener);
                let event = Arc::clone(&event);
                let handle =
                    tokio::spawn(async move { listener.handle(&event).await }.in_current_span());
                (name, handle)
            })
            .collect();

        let mut summary = PublishSummary::default();
        for (listener, handle) in handles {
            match handle.await {
                Ok(Ok(())) => summary.succeeded += 1,
                Ok(Err(e)) => {
                    error!(listener = %listener, error = %e, "Listener failed to handle event");
                    summary.failed.push(listener);
                }
                Err(e) => {
                    error!(listener = %listener, error = %e, "Listener task panicked");
                    summary.failed.push(listener);
                }
            }
        }

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed.len(),
            "Event published"
        );
        summary
    }
}
