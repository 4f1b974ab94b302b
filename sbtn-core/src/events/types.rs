//! Event type names and their payloads.
//!
//! Payload field names are part of the wire contract with consumers.

use sbtn_sdk::objects::IntegrationType;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::entities::UserId;

pub const USER_CREATED: &str = "user.created";
pub const USER_UPDATED: &str = "user.updated";
pub const PROJECT_CREATED: &str = "project.created";
pub const PROJECT_UPDATED: &str = "project.updated";
pub const PROJECT_DELETED: &str = "project.deleted";
pub const INTEGRATION_CREATED: &str = "integration.created";
pub const INTEGRATION_UPDATED: &str = "integration.updated";
pub const INTEGRATION_DELETED: &str = "integration.deleted";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreatedPayload {
    pub id: UserId,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub name: Option<String>,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdatedPayload {
    pub user_id: UserId,
    /// `free`, `pro-monthly` or `pro-yearly`.
    pub subscription_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub user_updated_at: OffsetDateTime,
    pub user_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCreatedPayload {
    pub user_id: UserId,
    pub project_id: Uuid,
    pub project_name: String,
    pub project_url: String,
    #[serde(with = "time::serde::rfc3339")]
    pub project_created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectUpdatedPayload {
    pub user_id: UserId,
    pub project_id: Uuid,
    pub project_name: String,
    pub project_url: String,
    pub project_icon: String,
    pub project_greeting: String,
    pub project_color: String,
    pub project_greeting_timeout: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub project_updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDeletedPayload {
    pub user_id: UserId,
    pub project_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub project_deleted_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationCreatedPayload {
    pub user_id: UserId,
    pub project_id: Uuid,
    pub integration_id: Uuid,
    pub integration_type: IntegrationType,
    pub integration_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub integration_created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationUpdatedPayload {
    pub user_id: UserId,
    pub project_id: Uuid,
    pub integration_id: Uuid,
    pub integration_type: IntegrationType,
    pub integration_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub integration_updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationDeletedPayload {
    pub user_id: UserId,
    pub project_id: Uuid,
    pub integration_id: Uuid,
    pub integration_type: IntegrationType,
    pub integration_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub integration_deleted_at: OffsetDateTime,
}
