use kanau::processor::Processor;
use sbtn_sdk::objects::ContentIntegration as SdkContentIntegration;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::entities::{IntegrationDetail, UserId};
use crate::framework::DatabaseProcessor;

/// Rich content card. Unlike the contact integrations it has no icon.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ContentIntegration {
    pub id: Uuid,
    pub user_id: UserId,
    pub project_id: Uuid,
    pub enabled: bool,
    pub name: String,
    pub title: String,
    pub summary: String,
    pub text: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<ContentIntegration> for SdkContentIntegration {
    fn from(value: ContentIntegration) -> Self {
        SdkContentIntegration {
            id: value.id,
            user_id: value.user_id.0,
            project_id: value.project_id,
            enabled: value.enabled,
            name: value.name,
            title: value.title,
            summary: value.summary,
            text: value.text,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<ContentIntegration> for IntegrationDetail {
    fn from(value: ContentIntegration) -> Self {
        IntegrationDetail::Content(value)
    }
}

#[derive(Debug, Clone)]
pub struct GetContentIntegrationsByIds {
    pub user_id: UserId,
    pub ids: Vec<Uuid>,
}

impl Processor<GetContentIntegrationsByIds> for DatabaseProcessor {
    type Output = Vec<ContentIntegration>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetContentIntegrationsByIds")]
    async fn process(
        &self,
        query: GetContentIntegrationsByIds,
    ) -> Result<Vec<ContentIntegration>, sqlx::Error> {
        if query.ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, ContentIntegration>(
            r#"
            SELECT id, user_id, project_id, enabled, name, title, summary, text,
                created_at, updated_at
            FROM content_integrations
            WHERE user_id = $1 AND id = ANY($2)
            "#,
        )
        .bind(query.user_id)
        .bind(query.ids)
        .fetch_all(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
pub struct GetContentIntegrationsByProject {
    pub user_id: UserId,
    pub project_id: Uuid,
}

impl Processor<GetContentIntegrationsByProject> for DatabaseProcessor {
    type Output = Vec<ContentIntegration>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetContentIntegrationsByProject")]
    async fn process(
        &self,
        query: GetContentIntegrationsByProject,
    ) -> Result<Vec<ContentIntegration>, sqlx::Error> {
        sqlx::query_as::<_, ContentIntegration>(
            r#"
            SELECT id, user_id, project_id, enabled, name, title, summary, text,
                created_at, updated_at
            FROM content_integrations
            WHERE user_id = $1 AND project_id = $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(query.user_id)
        .bind(query.project_id)
        .fetch_all(&self.pool)
        .await
    }
}
