use kanau::processor::Processor;
use sbtn_sdk::objects::WhatsappIntegration as SdkWhatsappIntegration;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::entities::{IntegrationDetail, UserId};
use crate::framework::DatabaseProcessor;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct WhatsappIntegration {
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

impl From<WhatsappIntegration> for SdkWhatsappIntegration {
    fn from(value: WhatsappIntegration) -> Self {
        SdkWhatsappIntegration {
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

impl From<WhatsappIntegration> for IntegrationDetail {
    fn from(value: WhatsappIntegration) -> Self {
        IntegrationDetail::Whatsapp(value)
    }
}

#[derive(Debug, Clone)]
pub struct GetWhatsappIntegrationsByIds {
    pub user_id: UserId,
    pub ids: Vec<Uuid>,
}

impl Processor<GetWhatsappIntegrationsByIds> for DatabaseProcessor {
    type Output = Vec<WhatsappIntegration>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetWhatsappIntegrationsByIds")]
    async fn process(
        &self,
        query: GetWhatsappIntegrationsByIds,
    ) -> Result<Vec<WhatsappIntegration>, sqlx::Error> {
        if query.ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, WhatsappIntegration>(
            r#"
            SELECT id, user_id, project_id, enabled, name, text, phone_number,
                icon, created_at, updated_at
            FROM whatsapp_integrations
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
pub struct GetWhatsappIntegrationsByProject {
    pub user_id: UserId,
    pub project_id: Uuid,
}

impl Processor<GetWhatsappIntegrationsByProject> for DatabaseProcessor {
    type Output = Vec<WhatsappIntegration>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetWhatsappIntegrationsByProject")]
    async fn process(
        &self,
        query: GetWhatsappIntegrationsByProject,
    ) -> Result<Vec<WhatsappIntegration>, sqlx::Error> {
        sqlx::query_as::<_, WhatsappIntegration>(
            r#"
            SELECT id, user_id, project_id, enabled, name, text, phone_number,
                icon, created_at, updated_at
            FROM whatsapp_integrations
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
