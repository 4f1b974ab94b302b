//! OAuth access tokens for the Cloud Tasks API.
//!
//! Google access tokens expire after about an hour. `MetadataTokenSource`
//! asks the GCE/Cloud Run metadata server for a token and caches it until
//! shortly before expiry, so every request carries a live token.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use url::Url;

use crate::queue::QueueError;

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// A cached token is replaced once it is this close to expiry.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    /// A bearer token that is valid for at least the next request.
    async fn access_token(&self) -> Result<String, QueueError>;
}

/// A fixed token, for emulators and short-lived jobs.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, QueueError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Seconds until the token expires.
    expires_in: u64,
}

struct CachedToken {
    token: String,
    refresh_at: Instant,
}

/// Tokens for the default service account, from the metadata server.
pub struct MetadataTokenSource {
    http_client: reqwest::Client,
    token_url: Url,
    cached: Mutex<Option<CachedToken>>,
}

impl MetadataTokenSource {
    pub fn new() -> Result<Self, url::ParseError> {
        Ok(Self::with_token_url(Url::parse(METADATA_TOKEN_URL)?))
    }

    pub fn with_token_url(token_url: Url) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            token_url,
            cached: Mutex::new(None),
        }
    }

    async fn fetch(&self) -> Result<TokenResponse, QueueError> {
        let response = self
            .http_client
            .get(self.token_url.clone())
            .header("Metadata-Flavor", "Google")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueueError::Credentials(format!(
                "metadata server returned {status}: {body}"
            )));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl AccessTokenSource for MetadataTokenSource {
    async fn access_token(&self) -> Result<String, QueueError> {
        // Held across the fetch so concurrent callers share one refresh.
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| Instant::now() < t.refresh_at) {
            return Ok(token.token.clone());
        }

        let fresh = self.fetch().await?;
        let lifetime = Duration::from_secs(fresh.expires_in).saturating_sub(REFRESH_MARGIN);
        debug!(expires_in = fresh.expires_in, "Access token refreshed");

        let token = fresh.access_token.clone();
        *cached = Some(CachedToken {
            token: fresh.access_token,
            refresh_at: Instant::now() + lifetime,
        });
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Serve `{"access_token": "token-N", "expires_in": <expires_in>}` to every
    /// request, counting them.
    async fn metadata_server(expires_in: u64) -> (Url, Arc<AtomicUsize>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = requests.clone();
        tokio::spawn(async move {
            loop {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut received = Vec::new();
                let mut buf = [0u8; 1024];
                while !received.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    received.extend_from_slice(&buf[..n]);
                }
                let request = String::from_utf8_lossy(&received).to_lowercase();
                assert!(request.contains("metadata-flavor: google"));

                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                let body = format!(r#"{{"access_token":"token-{n}","expires_in":{expires_in}}}"#);
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
            }
        });
        (
            Url::parse(&format!("http://{addr}/token")).unwrap(),
            requests,
        )
    }

    #[tokio::test]
    async fn test_metadata_token_is_cached_until_near_expiry() {
        let (url, requests) = metadata_server(3600).await;
        let source = MetadataTokenSource::with_token_url(url);

        assert_eq!(source.access_token().await.unwrap(), "token-1");
        assert_eq!(source.access_token().await.unwrap(), "token-1");
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expiring_metadata_token_is_refreshed() {
        let (url, requests) = metadata_server(30).await;
        let source = MetadataTokenSource::with_token_url(url);

        assert_eq!(source.access_token().await.unwrap(), "token-1");
        assert_eq!(source.access_token().await.unwrap(), "token-2");
        assert_eq!(requests.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_static_token() {
        let source = StaticToken::new("fixed");
        assert_eq!(source.access_token().await.unwrap(), "fixed");
    }
}
