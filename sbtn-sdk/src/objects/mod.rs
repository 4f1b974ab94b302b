pub mod event;
pub mod integrations;
pub mod settings;

pub use event::{Envelope, EnvelopeError, JSON_CONTENT_TYPE, SPEC_VERSION};
pub use integrations::{
    ContentIntegration, IntegrationSettings, IntegrationType, LinkIntegration,
    PhoneCallIntegration, WhatsappIntegration,
};
pub use settings::{
    ProjectIntegrationResponse, ProjectResponse, ProjectSettings, ProjectSettingsIntegration,
    UpdateIntegrationPositions,
};

#[cfg(test)]
mod tests {
    use crate::objects::{Envelope, JSON_CONTENT_TYPE, SPEC_VERSION};

    #[test]
    fn test_envelope_constants_reexported() {
        let envelope = Envelope::new("user.created", "/v1/users", &serde_json::json!({})).unwrap();
        assert_eq!(envelope.specversion, SPEC_VERSION);
        assert_eq!(envelope.datacontenttype.as_deref(), Some(JSON_CONTENT_TYPE));
    }
}
