use kanau::processor::Processor;
use sbtn_sdk::objects::ProjectIntegrationResponse;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::entities::{IntegrationType, UserId};
use crate::framework::DatabaseProcessor;

/// Ordering record: which integration appears at which position of a project.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ProjectIntegration {
    pub id: Uuid,
    pub user_id: UserId,
    pub project_id: Uuid,
    pub integration_id: Uuid,
    #[sqlx(rename = "type")]
    pub integration_type: IntegrationType,
    pub name: String,
    pub position: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<ProjectIntegration> for ProjectIntegrationResponse {
    fn from(value: ProjectIntegration) -> Self {
        ProjectIntegrationResponse {
            id: value.id,
            user_id: value.user_id.0,
            project_id: value.project_id,
            integration_id: value.integration_id,
            integration_type: value.integration_type.into(),
            name: value.name,
            position: value.position,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// All ordering records of a project, ascending by position.
#[derive(Debug, Clone)]
pub struct GetProjectIntegrations {
    pub user_id: UserId,
    pub project_id: Uuid,
}

impl Processor<GetProjectIntegrations> for DatabaseProcessor {
    type Output = Vec<ProjectIntegration>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetProjectIntegrations")]
    async fn process(
        &self,
        query: GetProjectIntegrations,
    ) -> Result<Vec<ProjectIntegration>, sqlx::Error> {
        let GetProjectIntegrations {
            user_id,
            project_id,
        } = query;
        sqlx::query_as::<_, ProjectIntegration>(
            r#"
            SELECT id, user_id, project_id, integration_id, type, name,
                position, created_at, updated_at
            FROM project_integrations
            WHERE user_id = $1 AND project_id = $2
            ORDER BY position ASC
            "#,
        )
        .bind(user_id)
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
    }
}

/// Rewrite positions so that each integration's position equals its index
/// in `integration_ids`. Runs in a single transaction.
#[derive(Debug, Clone)]
pub struct UpdateProjectIntegrationPositions {
    pub user_id: UserId,
    pub integration_ids: Vec<Uuid>,
}

impl Processor<UpdateProjectIntegrationPositions> for DatabaseProcessor {
    type Output = u64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:UpdateProjectIntegrationPositions")]
    async fn process(&self, update: UpdateProjectIntegrationPositions) -> Result<u64, sqlx::Error> {
        let UpdateProjectIntegrationPositions {
            user_id,
            integration_ids,
        } = update;
        let now = OffsetDateTime::now_utc();
        let mut tx = self.pool.begin().await?;
        let mut affected = 0;
        for (position, integration_id) in integration_ids.into_iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|e| sqlx::Error::Protocol(format!("position out of range: {e}")))?;
            let result = sqlx::query(
                r#"
                UPDATE project_integrations
                SET position = $1, updated_at = $2
                WHERE integration_id = $3 AND user_id = $4
                "#,
            )
            .bind(position)
            .bind(now)
            .bind(integration_id)
            .bind(&user_id)
            .execute(&mut *tx)
            .await?;
            affected += result.rows_affected();
        }
        tx.commit().await?;
        Ok(affected)
    }
}
