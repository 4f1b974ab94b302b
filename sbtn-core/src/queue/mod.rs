//! Push queue abstraction.
//!
//! A push queue accepts an HTTP task and later delivers it to its target
//! URL, retrying on failure. Delivery happens outside the request that
//! enqueued the task; the caller only learns whether the task was accepted.
//!
//! - `CloudTasksQueue`: Google Cloud Tasks, used in production
//! - `LocalPushQueue`: in-process channel plus delivery worker, for local runs

pub mod cloud_tasks;
pub mod local;
pub mod token;

pub use cloud_tasks::CloudTasksQueue;
pub use token::{AccessTokenSource, MetadataTokenSource, StaticToken};
pub use local::{LocalPushQueue, LocalQueueWorker, local_push_queue};

use async_trait::async_trait;
use reqwest::Method;
use thiserror::Error;
use url::Url;

/// Errors that can occur while handing a task to a queue.
#[derive(Debug, Error)]
pub enum QueueError {
    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The queue service refused the task
    #[error("queue rejected task with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// No usable access token for the queue service
    #[error("cannot obtain access token: {0}")]
    Credentials(String),

    /// The queue resource name does not form a valid API URL
    #[error("invalid queue name [{queue_name}]: {reason}")]
    InvalidQueueName { queue_name: String, reason: String },

    /// The in-process queue is no longer running
    #[error("queue is closed")]
    Closed,
}

/// An HTTP request to be delivered by a push queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Task {
    pub fn new(method: Method, url: Url, body: Vec<u8>) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A queue that takes ownership of HTTP tasks and delivers them later.
#[async_trait]
pub trait PushQueue: Send + Sync {
    /// Hand a task to the queue. Returns the queue-assigned task id.
    async fn enqueue(&self, task: Task) -> Result<String, QueueError>;
}
