//! Storage seams used by the services.
//!
//! Services depend on these traits rather than on the database directly so
//! that the aggregation and dispatch logic can run against in-memory
//! implementations. The Postgres implementations live in [`postgres`].

pub mod postgres;

pub use postgres::{
    PgEventRepository, PgIntegrationRepository, PgProjectIntegrationRepository,
    PgProjectRepository,
};

use async_trait::async_trait;
use sbtn_sdk::objects::Envelope;
use thiserror::Error;
use uuid::Uuid;

use crate::entities::project::Project;
use crate::entities::project_integration::ProjectIntegration;
use crate::entities::{IntegrationDetail, IntegrationType, UserId};

/// Errors that can occur in a repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The requested record does not exist for this user
    #[error("{entity} [{id}] not found")]
    NotFound { entity: &'static str, id: String },

    /// Event ids must be UUIDs to be stored
    #[error("event id [{0}] is not a UUID")]
    InvalidId(String),

    /// Stored event cannot be converted back to an envelope
    #[error("stored event is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

/// Append-only audit log of every dispatched event.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Store an event. Saving the same id twice keeps a single record.
    async fn save(&self, event: &Envelope) -> Result<(), RepositoryError>;

    /// Every stored event, ordered by event time.
    async fn fetch_all(&self) -> Result<Vec<Envelope>, RepositoryError>;
}

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Fails with [`RepositoryError::NotFound`] when the user owns no such project.
    async fn load(&self, user_id: &UserId, project_id: Uuid) -> Result<Project, RepositoryError>;
}

#[async_trait]
pub trait ProjectIntegrationRepository: Send + Sync {
    /// Ordering records of a project, ascending by position.
    async fn fetch(
        &self,
        user_id: &UserId,
        project_id: Uuid,
    ) -> Result<Vec<ProjectIntegration>, RepositoryError>;

    /// Set each integration's position to its index in `integration_ids`, atomically.
    async fn update_positions(
        &self,
        user_id: &UserId,
        integration_ids: &[Uuid],
    ) -> Result<(), RepositoryError>;
}

/// Detail records of a single integration type.
#[async_trait]
pub trait IntegrationRepository: Send + Sync {
    fn integration_type(&self) -> IntegrationType;

    /// Records of this type attached to a project.
    async fn fetch(
        &self,
        user_id: &UserId,
        project_id: Uuid,
    ) -> Result<Vec<IntegrationDetail>, RepositoryError>;

    /// Records with the given ids, in any order. Ids that do not exist are
    /// simply absent from the result.
    async fn fetch_multiple(
        &self,
        user_id: &UserId,
        integration_ids: &[Uuid],
    ) -> Result<Vec<IntegrationDetail>, RepositoryError>;
}
