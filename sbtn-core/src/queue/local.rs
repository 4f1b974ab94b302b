//! In-process push queue.
//!
//! The LocalQueueWorker is responsible for:
//! - Receiving tasks enqueued through `LocalPushQueue`
//! - Delivering each task over HTTP in its own tokio task
//! - Retrying failed deliveries with exponential backoff (2^0 to 2^11 seconds)
//! - Abandoning pending retries on shutdown
//!
//! Tasks live only in memory; anything not yet delivered is lost on restart.

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::queue::{PushQueue, QueueError, Task};

/// Maximum retry attempts (2^11 = 2048 seconds max backoff)
const MAX_RETRY_COUNT: u32 = 11;

/// Default buffer size for the task channel.
pub const DEFAULT_QUEUE_BUFFER: usize = 1024;

#[derive(Debug)]
struct QueuedTask {
    id: String,
    task: Task,
}

/// Sending half of the in-process queue.
#[derive(Debug, Clone)]
pub struct LocalPushQueue {
    tx: mpsc::Sender<QueuedTask>,
}

/// Receiving half of the in-process queue. Call [`LocalQueueWorker::run`] on a
/// background task.
pub struct LocalQueueWorker {
    rx: mpsc::Receiver<QueuedTask>,
    shutdown_rx: watch::Receiver<bool>,
    http_client: reqwest::Client,
}

/// Create a connected queue and worker pair.
pub fn local_push_queue(
    buffer: usize,
    shutdown_rx: watch::Receiver<bool>,
) -> (LocalPushQueue, LocalQueueWorker) {
    let (tx, rx) = mpsc::channel(buffer);
    let worker = LocalQueueWorker {
        rx,
        shutdown_rx,
        http_client: reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new()),
    };
    (LocalPushQueue { tx }, worker)
}

#[async_trait]
impl PushQueue for LocalPushQueue {
    async fn enqueue(&self, task: Task) -> Result<String, QueueError> {
        let id = format!("local-{}", Uuid::new_v4());
        self.tx
            .send(QueuedTask {
                id: id.clone(),
                task,
            })
            .await
            .map_err(|_| QueueError::Closed)?;
        Ok(id)
    }
}

impl LocalQueueWorker {
    /// Run the worker until shutdown is signalled or every queue handle is dropped.
    pub async fn run(mut self) {
        info!("LocalQueueWorker started");
        let mut deliveries = JoinSet::new();

        loop {
            tokio::select! {
                biased;

                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        info!("LocalQueueWorker received shutdown signal");
                        break;
                    }
                }

                Some(queued) = self.rx.recv() => {
                    debug!(task_id = %queued.id, url = %queued.task.url, "Received task");
                    deliveries.spawn(deliver_with_retry(
                        self.http_client.clone(),
                        queued,
                        self.shutdown_rx.clone(),
                    ));
                }

                Some(_) = deliveries.join_next(), if !deliveries.is_empty() => {}

                else => {
                    info!("Task channel closed");
                    break;
                }
            }
        }

        // In-flight requests finish; pending backoffs observe the shutdown and stop.
        while deliveries.join_next().await.is_some() {}

        info!("LocalQueueWorker shutdown complete");
    }
}

async fn deliver_with_retry(
    http_client: reqwest::Client,
    queued: QueuedTask,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let QueuedTask { id, task } = queued;
    for attempt in 0..=MAX_RETRY_COUNT {
        match send_task(&http_client, &task).await {
            Ok(()) => {
                info!(task_id = %id, attempt, "Task delivered");
                return;
            }
            Err(e) => {
                warn!(task_id = %id, url = %task.url, attempt, error = %e, "Task delivery failed");
            }
        }

        if attempt == MAX_RETRY_COUNT {
            break;
        }

        tokio::select! {
            biased;

            _ = shutdown_rx.changed() => {
                warn!(task_id = %id, "Dropping undelivered task on shutdown");
                return;
            }

            _ = tokio::time::sleep(calculate_retry_delay(attempt)) => {}
        }
    }

    error!(task_id = %id, url = %task.url, "Giving up on task after all retries");
}

async fn send_task(http_client: &reqwest::Client, task: &Task) -> Result<(), QueueError> {
    let mut request = http_client.request(task.method.clone(), task.url.clone());
    for (name, value) in &task.headers {
        request = request.header(name.as_str(), value.as_str());
    }
    let response = request.body(task.body.clone()).send().await?;

    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(QueueError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Calculate the next retry delay based on retry count.
///
/// Uses exponential backoff: 2^retry_count seconds.
pub fn calculate_retry_delay(retry_count: u32) -> std::time::Duration {
    let seconds = 2u64.pow(retry_count.min(MAX_RETRY_COUNT));
    std::time::Duration::from_secs(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use url::Url;

    fn task(url: &str) -> Task {
        Task::new(Method::POST, Url::parse(url).unwrap(), b"hello-body".to_vec())
            .with_header("X-Test", "1")
    }

    #[test]
    fn test_retry_delay_calculation() {
        assert_eq!(calculate_retry_delay(0), std::time::Duration::from_secs(1));
        assert_eq!(calculate_retry_delay(1), std::time::Duration::from_secs(2));
        assert_eq!(
            calculate_retry_delay(11),
            std::time::Duration::from_secs(2048)
        );
        // Max capped at 11
        assert_eq!(
            calculate_retry_delay(100),
            std::time::Duration::from_secs(2048)
        );
    }

    #[tokio::test]
    async fn test_enqueue_assigns_local_id() {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let (queue, mut worker) = local_push_queue(4, shutdown_rx);

        let id = queue.enqueue(task("http://localhost/consume")).await.unwrap();
        assert!(id.starts_with("local-"));

        let queued = worker.rx.recv().await.unwrap();
        assert_eq!(queued.id, id);
        assert_eq!(queued.task.header("x-test"), Some("1"));
    }

    #[tokio::test]
    async fn test_enqueue_fails_when_worker_is_gone() {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let (queue, worker) = local_push_queue(4, shutdown_rx);
        drop(worker);

        let result = queue.enqueue(task("http://localhost/consume")).await;
        assert!(matches!(result, Err(QueueError::Closed)));
    }

    #[tokio::test]
    async fn test_worker_stops_on_shutdown() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (_queue, worker) = local_push_queue(4, shutdown_rx);
        let handle = tokio::spawn(worker.run());

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_worker_delivers_task() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 1024];
            while !received.windows(10).any(|w| w == b"hello-body") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
            }
            socket
                .write_all(b"HTTP/1.1 204 No Content\r\ncontent-length: 0\r\n\r\n")
                .await
                .unwrap();
            String::from_utf8_lossy(&received).to_lowercase()
        });

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (queue, worker) = local_push_queue(4, shutdown_rx);
        let worker_handle = tokio::spawn(worker.run());

        queue
            .enqueue(task(&format!("http://{addr}/v1/events/consume")))
            .await
            .unwrap();

        let request = tokio::time::timeout(std::time::Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
        assert!(request.starts_with("post /v1/events/consume"));
        assert!(request.contains("x-test: 1"));

        shutdown_tx.send(true).unwrap();
        worker_handle.await.unwrap();
    }
}
