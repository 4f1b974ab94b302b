use async_trait::async_trait;
use kanau::processor::Processor;
use sbtn_sdk::objects::Envelope;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::entities::content_integration::{
    GetContentIntegrationsByIds, GetContentIntegrationsByProject,
};
use crate::entities::event_record::{GetAllEventRecords, UpsertEventRecord};
use crate::entities::link_integration::{GetLinkIntegrationsByIds, GetLinkIntegrationsByProject};
use crate::entities::phone_call_integration::{
    GetPhoneCallIntegrationsByIds, GetPhoneCallIntegrationsByProject,
};
use crate::entities::project::{GetProjectById, Project};
use crate::entities::project_integration::{
    GetProjectIntegrations, ProjectIntegration, UpdateProjectIntegrationPositions,
};
use crate::entities::whatsapp_integration::{
    GetWhatsappIntegrationsByIds, GetWhatsappIntegrationsByProject,
};
use crate::entities::{IntegrationDetail, IntegrationType, UserId};
use crate::framework::DatabaseProcessor;
use crate::repositories::{
    EventRepository, IntegrationRepository, ProjectIntegrationRepository, ProjectRepository,
    RepositoryError,
};

fn into_details<T: Into<IntegrationDetail>>(records: Vec<T>) -> Vec<IntegrationDetail> {
    records.into_iter().map(Into::into).collect()
}

#[derive(Debug, Clone)]
pub struct PgEventRepository {
    db: DatabaseProcessor,
}

impl PgEventRepository {
    pub fn new(db: DatabaseProcessor) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn save(&self, event: &Envelope) -> Result<(), RepositoryError> {
        let id = Uuid::parse_str(&event.id)
            .map_err(|_| RepositoryError::InvalidId(event.id.clone()))?;
        self.db
            .process(UpsertEventRecord {
                id,
                time: event.time.unwrap_or_else(OffsetDateTime::now_utc),
                source: event.source.clone(),
                event_type: event.event_type.clone(),
                data: serde_json::to_value(event)?,
            })
            .await?;
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<Envelope>, RepositoryError> {
        let records = self.db.process(GetAllEventRecords).await?;
        records
            .into_iter()
            .map(|record| Ok(serde_json::from_value(record.data.0)?))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct PgProjectRepository {
    db: DatabaseProcessor,
}

impl PgProjectRepository {
    pub fn new(db: DatabaseProcessor) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    async fn load(&self, user_id: &UserId, project_id: Uuid) -> Result<Project, RepositoryError> {
        self.db
            .process(GetProjectById {
                user_id: user_id.clone(),
                project_id,
            })
            .await?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "project",
                id: project_id.to_string(),
            })
    }
}

#[derive(Debug, Clone)]
pub struct PgProjectIntegrationRepository {
    db: DatabaseProcessor,
}

impl PgProjectIntegrationRepository {
    pub fn new(db: DatabaseProcessor) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProjectIntegrationRepository for PgProjectIntegrationRepository {
    async fn fetch(
        &self,
        user_id: &UserId,
        project_id: Uuid,
    ) -> Result<Vec<ProjectIntegration>, RepositoryError> {
        Ok(self
            .db
            .process(GetProjectIntegrations {
                user_id: user_id.clone(),
                project_id,
            })
            .await?)
    }

    async fn update_positions(
        &self,
        user_id: &UserId,
        integration_ids: &[Uuid],
    ) -> Result<(), RepositoryError> {
        self.db
            .process(UpdateProjectIntegrationPositions {
                user_id: user_id.clone(),
                integration_ids: integration_ids.to_vec(),
            })
            .await?;
        Ok(())
    }
}

/// Detail repository for one integration type, backed by that type's table.
#[derive(Debug, Clone)]
pub struct PgIntegrationRepository {
    db: DatabaseProcessor,
    integration_type: IntegrationType,
}

impl PgIntegrationRepository {
    pub fn new(db: DatabaseProcessor, integration_type: IntegrationType) -> Self {
        Self {
            db,
            integration_type,
        }
    }

    /// One repository per known integration type.
    pub fn all(db: &DatabaseProcessor) -> Vec<Self> {
        [
            IntegrationType::Whatsapp,
            IntegrationType::PhoneCall,
            IntegrationType::Link,
            IntegrationType::Content,
        ]
        .into_iter()
        .map(|integration_type| Self::new(db.clone(), integration_type))
        .collect()
    }
}

#[async_trait]
impl IntegrationRepository for PgIntegrationRepository {
    fn integration_type(&self) -> IntegrationType {
        self.integration_type
    }

    async fn fetch(
        &self,
        user_id: &UserId,
        project_id: Uuid,
    ) -> Result<Vec<IntegrationDetail>, RepositoryError> {
        let user_id = user_id.clone();
        let details = match self.integration_type {
            IntegrationType::Whatsapp => into_details(
                self.db
                    .process(GetWhatsappIntegrationsByProject {
                        user_id,
                        project_id,
                    })
                    .await?,
            ),
            IntegrationType::PhoneCall => into_details(
                self.db
                    .process(GetPhoneCallIntegrationsByProject {
                        user_id,
                        project_id,
                    })
                    .await?,
            ),
            IntegrationType::Link => into_details(
                self.db
                    .process(GetLinkIntegrationsByProject {
                        user_id,
                        project_id,
                    })
                    .await?,
            ),
            IntegrationType::Content => into_details(
                self.db
                    .process(GetContentIntegrationsByProject {
                        user_id,
                        project_id,
                    })
                    .await?,
            ),
        };
        Ok(details)
    }

    async fn fetch_multiple(
        &self,
        user_id: &UserId,
        integration_ids: &[Uuid],
    ) -> Result<Vec<IntegrationDetail>, RepositoryError> {
        let user_id = user_id.clone();
        let ids = integration_ids.to_vec();
        let details = match self.integration_type {
            IntegrationType::Whatsapp => into_details(
                self.db
                    .process(GetWhatsappIntegrationsByIds { user_id, ids })
                    .await?,
            ),
            IntegrationType::PhoneCall => into_details(
                self.db
                    .process(GetPhoneCallIntegrationsByIds { user_id, ids })
                    .await?,
            ),
            IntegrationType::Link => into_details(
                self.db
                    .process(GetLinkIntegrationsByIds { user_id, ids })
                    .await?,
            ),
            IntegrationType::Content => into_details(
                self.db
                    .process(GetContentIntegrationsByIds { user_id, ids })
                    .await?,
            ),
        };
        Ok(details)
    }
}
