//! ProjectSettingsService.
//!
//! Builds the read model a widget needs to render a project:
//! - Loads the project and its ordering records
//! - Groups the referenced integration ids by type
//! - Fetches every type's batch concurrently, one worker per type
//! - Fails the whole request on the first worker error, cancelling the rest
//! - Reassembles the integrations in ordering-record order
//!
//! Ordering records that point at a missing detail record are skipped. So
//! are records whose type has no registered repository.

use std::collections::HashMap;
use std::sync::Arc;

use itertools::Itertools;
use sbtn_sdk::objects::{
    ProjectSettings as SdkProjectSettings,
    ProjectSettingsIntegration as SdkProjectSettingsIntegration,
};
use thiserror::Error;
use tokio::task::{JoinError, JoinSet};
use tracing::{Instrument, debug, warn};
use uuid::Uuid;

use crate::entities::project::Project;
use crate::entities::{IntegrationDetail, IntegrationType, UserId};
use crate::repositories::{
    IntegrationRepository, ProjectIntegrationRepository, ProjectRepository, RepositoryError,
};

/// Errors that can occur while aggregating project settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Project lookup failed, including when it does not exist
    #[error("cannot load project [{project_id}]: {source}")]
    Project {
        project_id: Uuid,
        source: RepositoryError,
    },

    /// Ordering records could not be loaded
    #[error("cannot load integrations of project [{project_id}]: {source}")]
    Ordering {
        project_id: Uuid,
        source: RepositoryError,
    },

    /// A per-type batch fetch failed
    #[error("cannot fetch [{integration_type}] integrations: {source}")]
    Fetch {
        integration_type: IntegrationType,
        source: RepositoryError,
    },

    /// A fetch worker panicked or was cancelled
    #[error("integration fetch worker failed: {0}")]
    Worker(#[from] JoinError),
}

impl SettingsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SettingsError::Project { source, .. } if source.is_not_found())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSettings {
    pub project: Project,
    pub integrations: Vec<ProjectSettingsIntegration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSettingsIntegration {
    pub integration_type: IntegrationType,
    pub id: Uuid,
    pub settings: IntegrationDetail,
}

impl From<ProjectSettings> for SdkProjectSettings {
    fn from(value: ProjectSettings) -> Self {
        SdkProjectSettings {
            project: value.project.into(),
            integrations: value
                .integrations
                .into_iter()
                .map(|integration| SdkProjectSettingsIntegration {
                    integration_type: integration.integration_type.into(),
                    id: integration.id,
                    settings: integration.settings.into(),
                })
                .collect(),
        }
    }
}

pub struct ProjectSettingsService {
    projects: Arc<dyn ProjectRepository>,
    project_integrations: Arc<dyn ProjectIntegrationRepository>,
    integrations: HashMap<IntegrationType, Arc<dyn IntegrationRepository>>,
}

impl ProjectSettingsService {
    /// Create the service. When two repositories report the same type, the
    /// later one wins.
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        project_integrations: Arc<dyn ProjectIntegrationRepository>,
        integrations: impl IntoIterator<Item = Arc<dyn IntegrationRepository>>,
    ) -> Self {
        Self {
            projects,
            project_integrations,
            integrations: integrations
                .into_iter()
                .map(|repository| (repository.integration_type(), repository))
                .collect(),
        }
    }

    /// Integration types with a registered repository, in declaration order.
    pub fn integration_types(&self) -> Vec<IntegrationType> {
        let mut types: Vec<_> = self.integrations.keys().copied().collect();
        types.sort();
        types
    }

    /// Aggregate a project with its integrations in display order.
    ///
    /// Dropping the returned future aborts any fetch still running.
    #[tracing::instrument(skip(self, user_id), err, fields(user_id = %user_id))]
    pub async fn get(
        &self,
        user_id: &UserId,
        project_id: Uuid,
    ) -> Result<ProjectSettings, SettingsError> {
        let project = self
            .projects
            .load(user_id, project_id)
            .await
            .map_err(|source| SettingsError::Project { project_id, source })?;

        let ordering = self
            .project_integrations
            .fetch(user_id, project_id)
            .await
            .map_err(|source| SettingsError::Ordering { project_id, source })?;

        if ordering.is_empty() {
            return Ok(ProjectSettings {
                project,
                integrations: Vec::new(),
            });
        }

        let groups = ordering
            .iter()
            .map(|record| (record.integration_type, record.integration_id))
            .into_group_map();
        let mut details = self.fetch_in_parallel(user_id, groups).await?;

        let mut integrations = Vec::with_capacity(ordering.len());
        for record in &ordering {
            match details.remove(&record.integration_id) {
                Some(settings) => integrations.push(ProjectSettingsIntegration {
                    integration_type: record.integration_type,
                    id: record.integration_id,
                    settings,
                }),
                None => debug!(
                    integration_id = %record.integration_id,
                    integration_type = %record.integration_type,
                    "Skipping ordering record without detail record"
                ),
            }
        }

        Ok(ProjectSettings {
            project,
            integrations,
        })
    }

    /// Fetch one batch per type concurrently. Returns every detail record keyed
    /// by id, or the first error encountered.
    async fn fetch_in_parallel(
        &self,
        user_id: &UserId,
        groups: HashMap<IntegrationType, Vec<Uuid>>,
    ) -> Result<HashMap<Uuid, IntegrationDetail>, SettingsError> {
        let mut workers = JoinSet::new();
        for (integration_type, ids) in groups {
            let Some(repository) = self.integrations.get(&integration_type) else {
                warn!(
                    integration_type = %integration_type,
                    count = ids.len(),
                    "No repository registered for integration type"
                );
                continue;
            };
            let repository = Arc::clone(repository);
            let user_id = user_id.clone();
            workers.spawn(
                async move {
                    let result = repository.fetch_multiple(&user_id, &ids).await;
                    (integration_type, result)
                }
                .in_current_span(),
            );
        }

        let mut details = HashMap::new();
        while let Some(joined) = workers.join_next().await {
            let (integration_type, result) = match joined {
                Ok(output) => output,
                Err(e) => {
                    workers.abort_all();
                    return Err(SettingsError::Worker(e));
                }
            };
            match result {
                Ok(batch) => {
                    details.extend(batch.into_iter().map(|detail| (detail.id(), detail)));
                }
                Err(source) => {
                    workers.abort_all();
                    return Err(SettingsError::Fetch {
                        integration_type,
                        source,
                    });
                }
            }
        }
        Ok(details)
    }
}
