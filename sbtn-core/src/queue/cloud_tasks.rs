//! Google Cloud Tasks push queue.
//!
//! Tasks are created through the REST API
//! (`POST https://cloudtasks.googleapis.com/v2/{queue}/tasks`). Cloud Tasks
//! authenticates each delivery with an OIDC token minted for the configured
//! service account.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::queue::{AccessTokenSource, PushQueue, QueueError, Task};

const CLOUD_TASKS_API_URL: &str = "https://cloudtasks.googleapis.com/v2/";

#[derive(Debug, Serialize)]
struct CreateTaskRequest<'a> {
    task: CloudTask<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CloudTask<'a> {
    http_request: HttpRequest<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HttpRequest<'a> {
    url: &'a str,
    http_method: &'static str,
    headers: BTreeMap<&'a str, &'a str>,
    body: String,
    oidc_token: OidcToken<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OidcToken<'a> {
    service_account_email: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateTaskResponse {
    name: String,
}

/// `{api_url}{queue_name}/tasks`, for a `projects/{p}/locations/{l}/queues/{q}` name.
fn create_task_url(api_url: &Url, queue_name: &str) -> Result<Url, QueueError> {
    let invalid = |reason: String| QueueError::InvalidQueueName {
        queue_name: queue_name.to_string(),
        reason,
    };
    let segments: Vec<&str> = queue_name.split('/').collect();
    let well_formed = matches!(
        segments.as_slice(),
        ["projects", p, "locations", l, "queues", q]
            if !p.is_empty() && !l.is_empty() && !q.is_empty()
    );
    if !well_formed {
        return Err(invalid(
            "expected projects/{project}/locations/{location}/queues/{queue}".to_string(),
        ));
    }
    api_url
        .join(&format!("{queue_name}/tasks"))
        .map_err(|e| invalid(e.to_string()))
}

/// Cloud Tasks HTTP method names. Methods the API cannot express fall back to POST.
fn http_method_name(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        Method::PATCH => "PATCH",
        Method::HEAD => "HEAD",
        Method::OPTIONS => "OPTIONS",
        _ => "POST",
    }
}

pub struct CloudTasksQueue {
    http_client: reqwest::Client,
    /// Full queue resource name, `projects/{p}/locations/{l}/queues/{q}`.
    queue_name: String,
    tasks_url: Url,
    auth_email: String,
    tokens: Arc<dyn AccessTokenSource>,
}

impl CloudTasksQueue {
    pub fn new(
        queue_name: impl Into<String>,
        auth_email: impl Into<String>,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> Result<Self, QueueError> {
        let queue_name = queue_name.into();
        let api_url = Url::parse(CLOUD_TASKS_API_URL).map_err(|e| QueueError::InvalidQueueName {
            queue_name: queue_name.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            http_client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            tasks_url: create_task_url(&api_url, &queue_name)?,
            queue_name,
            auth_email: auth_email.into(),
            tokens,
        })
    }

    /// Point the queue at a different API root, e.g. an emulator.
    pub fn with_api_url(mut self, api_url: Url) -> Result<Self, QueueError> {
        self.tasks_url = create_task_url(&api_url, &self.queue_name)?;
        Ok(self)
    }

    fn build_request<'a>(&'a self, task: &'a Task) -> CreateTaskRequest<'a> {
        CreateTaskRequest {
            task: CloudTask {
                http_request: HttpRequest {
                    url: task.url.as_str(),
                    http_method: http_method_name(&task.method),
                    headers: task
                        .headers
                        .iter()
                        .map(|(key, value)| (key.as_str(), value.as_str()))
                        .collect(),
                    body: fast32::base64::RFC4648_NOPAD.encode(&task.body),
                    oidc_token: OidcToken {
                        service_account_email: &self.auth_email,
                    },
                },
            },
        }
    }
}

#[async_trait]
impl PushQueue for CloudTasksQueue {
    #[tracing::instrument(skip_all, err, fields(queue = %self.queue_name, url = %task.url))]
    async fn enqueue(&self, task: Task) -> Result<String, QueueError> {
        let access_token = self.tokens.access_token().await?;
        let response = self
            .http_client
            .post(self.tasks_url.clone())
            .bearer_auth(access_token)
            .json(&self.build_request(&task))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueueError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let created: CreateTaskResponse = response.json().await?;
        info!(task_name = %created.name, "Cloud task created");
        Ok(created.name)
    }
}
