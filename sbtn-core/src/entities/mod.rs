pub mod content_integration;
pub mod event_record;
pub mod link_integration;
pub mod phone_call_integration;
pub mod project;
pub mod project_integration;
pub mod whatsapp_integration;

use sbtn_sdk::objects::{
    IntegrationSettings as SdkIntegrationSettings, IntegrationType as SdkIntegrationType,
};
use uuid::Uuid;

use content_integration::ContentIntegration;
use link_integration::LinkIntegration;
use phone_call_integration::PhoneCallIntegration;
use whatsapp_integration::WhatsappIntegration;

/// Opaque identifier of the authenticated account owning projects and integrations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Integration type for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see `sbtn_sdk::objects::IntegrationType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "integration_type")]
pub enum IntegrationType {
    Whatsapp,
    #[sqlx(rename = "phone-call")]
    PhoneCall,
    Link,
    Content,
}

impl std::fmt::Display for IntegrationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&SdkIntegrationType::from(*self), f)
    }
}

impl From<IntegrationType> for SdkIntegrationType {
    fn from(value: IntegrationType) -> Self {
        match value {
            IntegrationType::Whatsapp => SdkIntegrationType::Whatsapp,
            IntegrationType::PhoneCall => SdkIntegrationType::PhoneCall,
            IntegrationType::Link => SdkIntegrationType::Link,
            IntegrationType::Content => SdkIntegrationType::Content,
        }
    }
}

impl From<SdkIntegrationType> for IntegrationType {
    fn from(value: SdkIntegrationType) -> Self {
        match value {
            SdkIntegrationType::Whatsapp => IntegrationType::Whatsapp,
            SdkIntegrationType::PhoneCall => IntegrationType::PhoneCall,
            SdkIntegrationType::Link => IntegrationType::Link,
            SdkIntegrationType::Content => IntegrationType::Content,
        }
    }
}

/// A detail record of any integration type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrationDetail {
    Whatsapp(WhatsappIntegration),
    PhoneCall(PhoneCallIntegration),
    Link(LinkIntegration),
    Content(ContentIntegration),
}

impl IntegrationDetail {
    pub fn id(&self) -> Uuid {
        match self {
            IntegrationDetail::Whatsapp(i) => i.id,
            IntegrationDetail::PhoneCall(i) => i.id,
            IntegrationDetail::Link(i) => i.id,
            IntegrationDetail::Content(i) => i.id,
        }
    }

    pub fn integration_type(&self) -> IntegrationType {
        match self {
            IntegrationDetail::Whatsapp(_) => IntegrationType::Whatsapp,
            IntegrationDetail::PhoneCall(_) => IntegrationType::PhoneCall,
            IntegrationDetail::Link(_) => IntegrationType::Link,
            IntegrationDetail::Content(_) => IntegrationType::Content,
        }
    }
}

impl From<IntegrationDetail> for SdkIntegrationSettings {
    fn from(value: IntegrationDetail) -> Self {
        match value {
            IntegrationDetail::Whatsapp(i) => SdkIntegrationSettings::Whatsapp(i.into()),
            IntegrationDetail::PhoneCall(i) => SdkIntegrationSettings::PhoneCall(i.into()),
            IntegrationDetail::Link(i) => SdkIntegrationSettings::Link(i.into()),
            IntegrationDetail::Content(i) => SdkIntegrationSettings::Content(i.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integration_type_conversion() {
        for sdk in SdkIntegrationType::ALL {
            let db = IntegrationType::from(sdk);
            assert_eq!(SdkIntegrationType::from(db), sdk);
            assert_eq!(db.to_string(), sdk.as_str());
        }
    }

    #[test]
    fn test_user_id_is_transparent() {
        let user_id = UserId::new("auth0|42");
        assert_eq!(serde_json::to_string(&user_id).unwrap(), "\"auth0|42\"");
        assert_eq!(user_id.to_string(), "auth0|42");
    }
}
