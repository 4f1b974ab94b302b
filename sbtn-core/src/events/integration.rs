//! Envelopes for integration lifecycle changes, built from an ordering
//! record snapshot.

use sbtn_sdk::objects::{Envelope, EnvelopeError};
use time::OffsetDateTime;

use crate::entities::project_integration::ProjectIntegration;
use crate::events::types::{
    INTEGRATION_CREATED, INTEGRATION_DELETED, INTEGRATION_UPDATED, IntegrationCreatedPayload,
    IntegrationDeletedPayload, IntegrationUpdatedPayload,
};

pub fn integration_created(
    source: &str,
    integration: &ProjectIntegration,
) -> Result<Envelope, EnvelopeError> {
    let payload = IntegrationCreatedPayload {
        user_id: integration.user_id.clone(),
        project_id: integration.project_id,
        integration_id: integration.integration_id,
        integration_type: integration.integration_type.into(),
        integration_name: integration.name.clone(),
        integration_created_at: integration.created_at,
    };
    Envelope::new(INTEGRATION_CREATED, source, &payload)
}

pub fn integration_updated(
    source: &str,
    integration: &ProjectIntegration,
) -> Result<Envelope, EnvelopeError> {
    let payload = IntegrationUpdatedPayload {
        user_id: integration.user_id.clone(),
        project_id: integration.project_id,
        integration_id: integration.integration_id,
        integration_type: integration.integration_type.into(),
        integration_name: integration.name.clone(),
        integration_updated_at: integration.updated_at,
    };
    Envelope::new(INTEGRATION_UPDATED, source, &payload)
}

/// The record is usually gone by the time this is built, so the deletion
/// time is taken from the caller.
pub fn integration_deleted(
    source: &str,
    integration: &ProjectIntegration,
    deleted_at: OffsetDateTime,
) -> Result<Envelope, EnvelopeError> {
    let payload = IntegrationDeletedPayload {
        user_id: integration.user_id.clone(),
        project_id: integration.project_id,
        integration_id: integration.integration_id,
        integration_type: integration.integration_type.into(),
        integration_name: integration.name.clone(),
        integration_deleted_at: deleted_at,
    };
    Envelope::new(INTEGRATION_DELETED, source, &payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{IntegrationType, UserId};
    use uuid::Uuid;

    fn snapshot() -> ProjectIntegration {
        ProjectIntegration {
            id: Uuid::new_v4(),
            user_id: UserId::new("user-1"),
            project_id: Uuid::new_v4(),
            integration_id: Uuid::new_v4(),
            integration_type: IntegrationType::Whatsapp,
            name: "Support chat".to_string(),
            position: 0,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_integration_created_envelope() {
        let integration = snapshot();
        let event = integration_created("/v1/integrations", &integration).unwrap();
        assert_eq!(event.event_type, INTEGRATION_CREATED);
        assert_eq!(event.source, "/v1/integrations");
        assert!(event.validate().is_ok());

        let payload: IntegrationCreatedPayload = event.data_as().unwrap();
        assert_eq!(payload.integration_id, integration.integration_id);
        assert_eq!(payload.integration_name, "Support chat");
    }

    #[test]
    fn test_integration_deleted_uses_given_time() {
        let integration = snapshot();
        let deleted_at = OffsetDateTime::UNIX_EPOCH + time::Duration::days(1);
        let event = integration_deleted("/v1/integrations", &integration, deleted_at).unwrap();
        let payload: IntegrationDeletedPayload = event.data_as().unwrap();
        assert_eq!(payload.integration_deleted_at, deleted_at);
        assert_eq!(event.event_type, INTEGRATION_DELETED);
    }

    #[test]
    fn test_integration_updated_envelope() {
        let event = integration_updated("/v1/integrations", &snapshot()).unwrap();
        assert_eq!(event.event_type, INTEGRATION_UPDATED);
    }
}
