//! HTTP API.
//!
//! # Endpoints
//!
//! - `POST /v1/events/consume`                        – push queue delivery target
//! - `GET  /v1/projects/{project_id}/settings`        – aggregated widget settings
//! - `GET  /v1/projects/{project_id}/integrations`    – ordering records
//! - `PUT  /v1/projects/{project_id}/integrations`    – reorder integrations

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub mod events;
pub mod extractors;
pub mod projects;

#[cfg(test)]
mod tests;

/// Build the `/v1` router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events/consume", post(events::consume))
        .route(
            "/projects/{project_id}/settings",
            get(projects::get_settings),
        )
        .route(
            "/projects/{project_id}/integrations",
            get(projects::list_integrations).put(projects::update_positions),
        )
}
