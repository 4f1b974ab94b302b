use kanau::processor::Processor;
use sbtn_sdk::objects::PhoneCallIntegration as SdkPhoneCallIntegration;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::entities::{IntegrationDetail, UserId};
use crate::framework::DatabaseProcessor;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PhoneCallIntegration {
    pub id: Uuid,
    pub user_id: UserId,
    pub project_id: Uuid,
    pub enabled: bool,
    pub name: String,
    pub text: String,
    pub phone_number: String,
    pub icon: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<PhoneCallIntegration> for SdkPhoneCallIntegration {
    fn from(value: PhoneCallIntegration) -> Self {
        SdkPhoneCallIntegration {
            id: value.id,
            user_id: value.user_id.0,
            project_id: value.project_id,
            enabled: value.enabled,
            name: value.name,
            text: value.text,
            phone_number: value.phone_number,
            icon: value.icon,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<PhoneCallIntegration> for IntegrationDetail {
    fn from(value: PhoneCallIntegration) -> Self {
        IntegrationDetail::PhoneCall(value)
    }
}

#[derive(Debug, Clone)]
pub struct GetPhoneCallIntegrationsByIds {
    pub user_id: UserId,
    pub ids: Vec<Uuid>,
}

impl Processor<GetPhoneCallIntegrationsByIds> for DatabaseProcessor {
    type Output = Vec<PhoneCallIntegration>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetPhoneCallIntegrationsByIds")]
    async fn process(
        &self,
        query: GetPhoneCallIntegrationsByIds,
    ) -> Result<Vec<PhoneCallIntegration>, sqlx::Error> {
        if query.ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, PhoneCallIntegration>(
            r#"
            SELECT id, user_id, project_id, enabled, name, text, phone_number,
                icon, created_at, updated_at
            FROM phone_call_integrations
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
pub struct GetPhoneCallIntegrationsByProject {
    pub user_id: UserId,
    pub project_id: Uuid,
}

impl Processor<GetPhoneCallIntegrationsByProject> for DatabaseProcessor {
    type Output = Vec<PhoneCallIntegration>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetPhoneCallIntegrationsByProject")]
    async fn process(
        &self,
        query: GetPhoneCallIntegrationsByProject,
    ) -> Result<Vec<PhoneCallIntegration>, sqlx::Error> {
        sqlx::query_as::<_, PhoneCallIntegration>(
            r#"
            SELECT id, user_id, project_id, enabled, name, text, phone_number,
                icon, created_at, updated_at
            FROM phone_call_integrations
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
