//! Application state shared across all request handlers.

use sbtn_core::framework::DatabaseProcessor;
use sbtn_core::processors::{
    EventDispatcher, MarketingListener, ProjectIntegrationService, ProjectSettingsService,
    SendgridContactList,
};
use sbtn_core::queue::PushQueue;
use sbtn_core::repositories::{
    IntegrationRepository, PgEventRepository, PgIntegrationRepository,
    PgProjectIntegrationRepository, PgProjectRepository,
};
use std::sync::Arc;

use crate::config::{ConfigError, LoadedConfig, get_env};

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<EventDispatcher>,
    pub settings: Arc<ProjectSettingsService>,
    pub project_integrations: Arc<ProjectIntegrationService>,
    /// Secret the consume endpoint verifies deliveries with.
    pub signing_secret: Option<Arc<[u8]>>,
}

impl AppState {
    /// Wire the Postgres repositories, the push queue and the listeners.
    ///
    /// Listeners are registered here, before the dispatcher is shared.
    pub fn new(
        db: DatabaseProcessor,
        config: &LoadedConfig,
        queue: Arc<dyn PushQueue>,
    ) -> Result<Self, ConfigError> {
        let mut dispatcher = EventDispatcher::new(
            Arc::new(PgEventRepository::new(db.clone())),
            queue,
            config.events.consumer_url.clone(),
        );
        if let Some(secret) = &config.events.signing_secret {
            dispatcher = dispatcher.with_signing_secret(secret.to_vec());
        }

        if let Some(marketing) = &config.marketing {
            let contacts = SendgridContactList::new(
                get_env("SENDGRID_API_KEY")?,
                marketing.list_id.clone(),
            );
            let listener = Arc::new(MarketingListener::new(Arc::new(contacts)));
            dispatcher.subscribe_all(listener.subscriptions());
            tracing::info!(list_id = %marketing.list_id, "Marketing listener registered");
        }

        let dispatcher = Arc::new(dispatcher);
        let project_integrations = Arc::new(PgProjectIntegrationRepository::new(db.clone()));
        let settings = ProjectSettingsService::new(
            Arc::new(PgProjectRepository::new(db.clone())),
            project_integrations.clone(),
            PgIntegrationRepository::all(&db)
                .into_iter()
                .map(|repository| Arc::new(repository) as Arc<dyn IntegrationRepository>),
        );

        Ok(Self {
            project_integrations: Arc::new(ProjectIntegrationService::new(
                project_integrations,
                dispatcher.clone(),
                config.events.source.clone(),
            )),
            dispatcher,
            settings: Arc::new(settings),
            signing_secret: config
                .events
                .signing_secret
                .as_deref()
                .map(Arc::<[u8]>::from),
        })
    }
}
