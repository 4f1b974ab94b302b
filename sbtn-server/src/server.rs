//! Router assembly and the listening loop.

use crate::api;
use crate::shutdown::shutdown_signal;
use crate::state::AppState;
use axum::extract::State;
use axum::{Json, Router, routing::get};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/v1", api::router())
        .with_state(state)
}

/// What this instance is wired to handle.
#[derive(Serialize)]
struct Health {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    /// Event types the consume endpoint has listeners for.
    event_types: Vec<String>,
    /// Integration types the settings endpoint can load.
    integration_types: Vec<String>,
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        event_types: state
            .dispatcher
            .subscribed_event_types()
            .into_iter()
            .map(str::to_string)
            .collect(),
        integration_types: state
            .settings
            .integration_types()
            .iter()
            .map(ToString::to_string)
            .collect(),
    })
}

/// Serve until SIGTERM/SIGINT, which also flips `shutdown_tx` for the
/// background workers.
pub async fn run_server(
    router: Router,
    addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Superbutton API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
}
