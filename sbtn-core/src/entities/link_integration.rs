use kanau::processor::Processor;
use sbtn_sdk::objects::LinkIntegration as SdkLinkIntegration;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::entities::{IntegrationDetail, UserId};
use crate::framework::DatabaseProcessor;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct LinkIntegration {
    pub id: Uuid,
    pub user_id: UserId,
    pub project_id: Uuid,
    pub enabled: bool,
    pub name: String,
    pub text: String,
    pub url: String,
    pub icon: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<LinkIntegration> for SdkLinkIntegration {
    fn from(value: LinkIntegration) -> Self {
        SdkLinkIntegration {
            id: value.id,
            user_id: value.user_id.0,
            project_id: value.project_id,
            enabled: value.enabled,
            name: value.name,
            text: value.text,
            url: value.url,
            icon: value.icon,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<LinkIntegration> for IntegrationDetail {
    fn from(value: LinkIntegration) -> Self {
        IntegrationDetail::Link(value)
    }
}

#[derive(Debug, Clone)]
pub struct GetLinkIntegrationsByIds {
    pub user_id: UserId,
    pub ids: Vec<Uuid>,
}

impl Processor<GetLinkIntegrationsByIds> for DatabaseProcessor {
    type Output = Vec<LinkIntegration>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetLinkIntegrationsByIds")]
    async fn process(
        &self,
        query: GetLinkIntegrationsByIds,
    ) -> Result<Vec<LinkIntegration>, sqlx::Error> {
        if query.ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, LinkIntegration>(
            r#"
            SELECT id, user_id, project_id, enabled, name, text, url, icon,
                created_at, updated_at
            FROM link_integrations
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
pub struct GetLinkIntegrationsByProject {
    pub user_id: UserId,
    pub project_id: Uuid,
}

impl Processor<GetLinkIntegrationsByProject> for DatabaseProcessor {
    type Output = Vec<LinkIntegration>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetLinkIntegrationsByProject")]
    async fn process(
        &self,
        query: GetLinkIntegrationsByProject,
    ) -> Result<Vec<LinkIntegration>, sqlx::Error> {
        sqlx::query_as::<_, LinkIntegration>(
            r#"
            SELECT id, user_id, project_id, enabled, name, text, url, icon,
                created_at, updated_at
            FROM link_integrations
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
