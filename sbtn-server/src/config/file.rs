//! TOML file configuration structures.
//!
//! These structs directly map to the `superbutton.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub events: EventsConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    pub marketing: Option<MarketingConfig>,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

/// Event delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Public URL of `POST /v1/events/consume`; push tasks are addressed here.
    pub consumer_url: Url,
    /// Shared secret for signing push task bodies. Deliveries are not
    /// authenticated when absent.
    pub signing_secret: Option<String>,
    /// Value of the envelope `source` attribute for events produced here.
    #[serde(default = "default_event_source")]
    pub source: String,
}

fn default_event_source() -> String {
    "superbutton-api".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueueKind {
    #[default]
    Local,
    CloudTasks,
}

/// Push queue configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default)]
    pub kind: QueueKind,
    /// Full Cloud Tasks queue name, `projects/{p}/locations/{l}/queues/{q}`.
    pub queue_name: Option<String>,
    /// Service account used for the OIDC token attached to each delivery.
    pub auth_email: Option<String>,
}

/// Marketing contact list configuration. The marketing listener is only
/// registered when this section is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketingConfig {
    pub list_id: String,
}
