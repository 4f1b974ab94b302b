//! Integration detail records as exposed to widget and dashboard clients.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Integration kinds a project can expose.
///
/// This is the API/DTO version without sqlx::Type.
/// For database operations, use the version in `sbtn-core::entities`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntegrationType {
    Whatsapp,
    PhoneCall,
    Link,
    Content,
}

impl IntegrationType {
    pub const ALL: [IntegrationType; 4] = [
        IntegrationType::Whatsapp,
        IntegrationType::PhoneCall,
        IntegrationType::Link,
        IntegrationType::Content,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationType::Whatsapp => "whatsapp",
            IntegrationType::PhoneCall => "phone-call",
            IntegrationType::Link => "link",
            IntegrationType::Content => "content",
        }
    }
}

impl std::fmt::Display for IntegrationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// WhatsApp chat link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhatsappIntegration {
    pub id: Uuid,
    pub user_id: String,
    pub project_id: Uuid,
    pub enabled: bool,
    pub name: String,
    pub text: String,
    pub phone_number: String,
    pub icon: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Click-to-call phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneCallIntegration {
    pub id: Uuid,
    pub user_id: String,
    pub project_id: Uuid,
    pub enabled: bool,
    pub name: String,
    pub text: String,
    pub phone_number: String,
    pub icon: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Plain hyperlink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkIntegration {
    pub id: Uuid,
    pub user_id: String,
    pub project_id: Uuid,
    pub enabled: bool,
    pub name: String,
    pub text: String,
    pub url: String,
    pub icon: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Content card (FAQ entry, announcement, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentIntegration {
    pub id: Uuid,
    pub user_id: String,
    pub project_id: Uuid,
    pub enabled: bool,
    pub name: String,
    pub title: String,
    pub summary: String,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Any integration detail record. Serialized without a tag: the type is
/// carried next to it in [`super::ProjectSettingsIntegration`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum IntegrationSettings {
    Whatsapp(WhatsappIntegration),
    PhoneCall(PhoneCallIntegration),
    Link(LinkIntegration),
    Content(ContentIntegration),
}

impl IntegrationSettings {
    pub fn integration_type(&self) -> IntegrationType {
        match self {
            IntegrationSettings::Whatsapp(_) => IntegrationType::Whatsapp,
            IntegrationSettings::PhoneCall(_) => IntegrationType::PhoneCall,
            IntegrationSettings::Link(_) => IntegrationType::Link,
            IntegrationSettings::Content(_) => IntegrationType::Content,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            IntegrationSettings::Whatsapp(i) => i.id,
            IntegrationSettings::PhoneCall(i) => i.id,
            IntegrationSettings::Link(i) => i.id,
            IntegrationSettings::Content(i) => i.id,
        }
    }
}
