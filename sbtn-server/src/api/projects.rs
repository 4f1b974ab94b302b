//! Project settings and integration ordering handlers.
//!
//! Every endpoint is scoped to the caller identified by [`CallerId`].

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sbtn_core::processors::{ProjectIntegrationError, SettingsError};
use sbtn_sdk::objects::{ProjectIntegrationResponse, ProjectSettings, UpdateIntegrationPositions};
use serde_json::json;
use uuid::Uuid;

use crate::api::extractors::CallerId;
use crate::state::AppState;

/// Errors that can occur in the projects API.
#[derive(Debug)]
pub enum ProjectsApiError {
    Settings(SettingsError),
    Integrations(ProjectIntegrationError),
}

impl IntoResponse for ProjectsApiError {
    fn into_response(self) -> Response {
        match self {
            ProjectsApiError::Settings(e) if e.is_not_found() => {
                (StatusCode::NOT_FOUND, Json(json!({ "message": e.to_string() }))).into_response()
            }
            ProjectsApiError::Integrations(
                e @ (ProjectIntegrationError::Empty | ProjectIntegrationError::Duplicate(_)),
            ) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "message": "validation errors while updating integrations",
                    "errors": { "integrations": [e.to_string()] },
                })),
            )
                .into_response(),
            ProjectsApiError::Settings(e) => {
                tracing::error!(error = %e, "Projects API settings error");
                internal_error()
            }
            ProjectsApiError::Integrations(e) => {
                tracing::error!(error = %e, "Projects API integrations error");
                internal_error()
            }
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": "internal server error" })),
    )
        .into_response()
}

/// `GET /v1/projects/{project_id}/settings`: project plus ordered integrations.
pub(super) async fn get_settings(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ProjectSettings>, ProjectsApiError> {
    let settings = state
        .settings
        .get(&user_id, project_id)
        .await
        .map_err(ProjectsApiError::Settings)?;
    Ok(Json(settings.into()))
}

/// `GET /v1/projects/{project_id}/integrations`: ordering records by position.
pub(super) async fn list_integrations(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<ProjectIntegrationResponse>>, ProjectsApiError> {
    let records = state
        .project_integrations
        .index(&user_id, project_id)
        .await
        .map_err(ProjectsApiError::Integrations)?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

/// `PUT /v1/projects/{project_id}/integrations`: the index of each id in the
/// body becomes its position.
pub(super) async fn update_positions(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(project_id): Path<Uuid>,
    Json(request): Json<UpdateIntegrationPositions>,
) -> Result<Json<Vec<ProjectIntegrationResponse>>, ProjectsApiError> {
    let records = state
        .project_integrations
        .update_positions(&user_id, project_id, &request.integrations)
        .await
        .map_err(ProjectsApiError::Integrations)?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}
