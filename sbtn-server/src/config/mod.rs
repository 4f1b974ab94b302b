//! Configuration module for sbtn-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables.

pub mod file;

use crate::config::file::{FileConfig, QueueKind};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("{0} environment variable not set")]
    MissingEnv(&'static str),
}

/// Listener settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

/// Event delivery settings.
#[derive(Debug, Clone)]
pub struct EventsConfig {
    pub consumer_url: Url,
    pub signing_secret: Option<Box<[u8]>>,
    pub source: String,
}

/// Which push queue carries dispatched events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueConfig {
    Local,
    CloudTasks {
        queue_name: String,
        auth_email: String,
    },
}

#[derive(Debug, Clone)]
pub struct MarketingConfig {
    pub list_id: String,
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub events: EventsConfig,
    pub queue: QueueConfig,
    pub marketing: Option<MarketingConfig>,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        build_loaded_config(file_config)
    }
}

fn build_loaded_config(file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
    let FileConfig {
        server,
        events,
        queue,
        marketing,
    } = file_config;

    if events.source.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "events.source must not be empty".to_string(),
        ));
    }
    let signing_secret = match events.signing_secret {
        Some(secret) if secret.is_empty() => {
            return Err(ConfigError::ValidationError(
                "events.signing_secret must not be empty when set".to_string(),
            ));
        }
        secret => secret.map(|s| s.into_bytes().into_boxed_slice()),
    };

    let queue = match queue.kind {
        QueueKind::Local => QueueConfig::Local,
        QueueKind::CloudTasks => {
            let (Some(queue_name), Some(auth_email)) = (queue.queue_name, queue.auth_email) else {
                return Err(ConfigError::ValidationError(
                    "queue.queue_name and queue.auth_email are required for cloud-tasks"
                        .to_string(),
                ));
            };
            QueueConfig::CloudTasks {
                queue_name,
                auth_email,
            }
        }
    };

    Ok(LoadedConfig {
        server: ServerConfig {
            listen: server.listen,
        },
        events: EventsConfig {
            consumer_url: events.consumer_url,
            signing_secret,
            source: events.source,
        },
        queue,
        marketing: marketing.map(|m| MarketingConfig { list_id: m.list_id }),
    })
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    get_env("DATABASE_URL")
}

/// Read a required secret from the environment.
pub fn get_env(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnv(name))
}
