//! Superbutton API server
//!
//! Serves widget settings and consumes lifecycle events delivered by the
//! push queue.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::{Parser, Subcommand, ValueEnum};
use config::{ConfigLoader, LoadedConfig, QueueConfig, get_database_url};
use sbtn_core::framework::DatabaseProcessor;
use sbtn_core::queue::{
    AccessTokenSource, CloudTasksQueue, MetadataTokenSource, PushQueue, StaticToken,
    local::DEFAULT_QUEUE_BUFFER, local_push_queue,
};
use sbtn_core::repositories::{EventRepository, PgEventRepository};
use server::{build_router, run_server};
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Superbutton - widget configuration backend
#[derive(Parser, Debug)]
#[command(name = "sbtn-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./superbutton.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every stored event as JSON lines, oldest first
    Events,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    init_tracing(args.log_format);

    tracing::info!("Starting sbtn-server v{}", env!("CARGO_PKG_VERSION"));

    // Get database URL from environment
    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    // Run migrations if requested
    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    let db = DatabaseProcessor::new(db_pool.clone());

    if let Some(Command::Events) = args.command {
        let result = print_events(&PgEventRepository::new(db)).await;
        db_pool.close().await;
        return result;
    }

    // Load configuration
    let loaded_config = ConfigLoader::new(&args.config, args.listen)
        .load()
        .map_err(|e| {
            tracing::error!("Failed to load configuration: {}", e);
            e
        })?;
    let listen_addr = loaded_config.server.listen;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Create the push queue
    let (queue, queue_worker) = build_queue(&loaded_config, shutdown_rx)?;

    // Create application state
    let state = AppState::new(db, &loaded_config, queue)?;

    // Build the router
    let router = build_router(state);

    // Run the server
    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr, shutdown_tx).await;

    // Wait for queued deliveries to wind down
    if let Some(worker) = queue_worker {
        if let Err(e) = worker.await {
            tracing::error!(error = %e, "Local queue worker failed");
        }
    }

    // Close database connections gracefully
    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Create the configured push queue. The local queue also returns the
/// handle of its delivery worker.
fn build_queue(
    config: &LoadedConfig,
    shutdown_rx: watch::Receiver<bool>,
) -> anyhow::Result<(Arc<dyn PushQueue>, Option<tokio::task::JoinHandle<()>>)> {
    match &config.queue {
        QueueConfig::Local => {
            tracing::info!("Using in-process push queue");
            let (queue, worker) = local_push_queue(DEFAULT_QUEUE_BUFFER, shutdown_rx);
            let handle = tokio::spawn(worker.run());
            Ok((Arc::new(queue), Some(handle)))
        }
        QueueConfig::CloudTasks {
            queue_name,
            auth_email,
        } => {
            tracing::info!(queue = %queue_name, "Using Cloud Tasks push queue");
            // A fixed token is only suitable for emulators; it is never refreshed.
            let tokens: Arc<dyn AccessTokenSource> =
                match std::env::var("CLOUD_TASKS_ACCESS_TOKEN") {
                    Ok(token) => {
                        tracing::warn!("Using fixed Cloud Tasks access token");
                        Arc::new(StaticToken::new(token))
                    }
                    Err(_) => Arc::new(MetadataTokenSource::new()?),
                };
            let queue = CloudTasksQueue::new(queue_name.clone(), auth_email.clone(), tokens)?;
            Ok((Arc::new(queue), None))
        }
    }
}

/// Write every stored event to stdout, one JSON document per line.
async fn print_events(repository: &dyn EventRepository) -> anyhow::Result<()> {
    let events = repository.fetch_all().await?;
    tracing::info!(count = events.len(), "Fetched stored events");
    for event in events {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}
