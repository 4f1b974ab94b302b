//! Project settings read model and ordering requests.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::integrations::{IntegrationSettings, IntegrationType};

/// Project snapshot returned alongside its integrations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub url: String,
    pub icon: String,
    pub greeting: String,
    pub color: String,
    pub greeting_timeout_seconds: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Everything the widget needs to render a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSettings {
    pub project: ProjectResponse,
    pub integrations: Vec<ProjectSettingsIntegration>,
}

/// One entry of [`ProjectSettings::integrations`], in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSettingsIntegration {
    #[serde(rename = "type")]
    pub integration_type: IntegrationType,
    pub id: Uuid,
    pub settings: IntegrationSettings,
}

/// An ordering record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectIntegrationResponse {
    pub id: Uuid,
    pub user_id: String,
    pub project_id: Uuid,
    pub integration_id: Uuid,
    #[serde(rename = "type")]
    pub integration_type: IntegrationType,
    pub name: String,
    pub position: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// `PUT /v1/projects/{project_id}/integrations` body.
///
/// The index of each id in `integrations` becomes its new position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateIntegrationPositions {
    pub integrations: Vec<Uuid>,
}
