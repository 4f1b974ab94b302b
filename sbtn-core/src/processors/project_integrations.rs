use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::UserId;
use crate::entities::project_integration::ProjectIntegration;
use crate::events::integration_updated;
use crate::processors::EventDispatcher;
use crate::repositories::{ProjectIntegrationRepository, RepositoryError};

#[derive(Debug, Error)]
pub enum ProjectIntegrationError {
    #[error("at least one integration id is required")]
    Empty,

    #[error("integration [{0}] appears more than once")]
    Duplicate(Uuid),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Lists and reorders the ordering records of a project.
///
/// Every integration whose position changes is announced with an
/// `integration.updated` event.
pub struct ProjectIntegrationService {
    repository: Arc<dyn ProjectIntegrationRepository>,
    dispatcher: Arc<EventDispatcher>,
    event_source: String,
}

impl ProjectIntegrationService {
    pub fn new(
        repository: Arc<dyn ProjectIntegrationRepository>,
        dispatcher: Arc<EventDispatcher>,
        event_source: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            dispatcher,
            event_source: event_source.into(),
        }
    }

    pub async fn index(
        &self,
        user_id: &UserId,
        project_id: Uuid,
    ) -> Result<Vec<ProjectIntegration>, ProjectIntegrationError> {
        Ok(self.repository.fetch(user_id, project_id).await?)
    }

    /// Move each integration to the position of its index in `integration_ids`,
    /// then return the project's ordering records.
    #[tracing::instrument(skip(self, user_id, integration_ids), err, fields(user_id = %user_id, count = integration_ids.len()))]
    pub async fn update_positions(
        &self,
        user_id: &UserId,
        project_id: Uuid,
        integration_ids: &[Uuid],
    ) -> Result<Vec<ProjectIntegration>, ProjectIntegrationError> {
        if integration_ids.is_empty() {
            return Err(ProjectIntegrationError::Empty);
        }
        let mut seen = HashSet::with_capacity(integration_ids.len());
        if let Some(duplicate) = integration_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(ProjectIntegrationError::Duplicate(*duplicate));
        }

        let before: HashMap<Uuid, i32> = self
            .index(user_id, project_id)
            .await?
            .into_iter()
            .map(|record| (record.integration_id, record.position))
            .collect();

        self.repository
            .update_positions(user_id, integration_ids)
            .await?;
        info!("Integration positions updated");

        let after = self.index(user_id, project_id).await?;
        for record in after
            .iter()
            .filter(|record| before.get(&record.integration_id) != Some(&record.position))
        {
            match integration_updated(&self.event_source, record) {
                Ok(event) => self.dispatcher.dispatch_best_effort(&event).await,
                Err(e) => warn!(
                    integration_id = %record.integration_id,
                    error = %e,
                    "Cannot build integration.updated event"
                ),
            }
        }
        Ok(after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::IntegrationType;
    use crate::events::{INTEGRATION_UPDATED, IntegrationUpdatedPayload};
    use crate::queue::{PushQueue, QueueError, Task};
    use crate::repositories::EventRepository;
    use async_trait::async_trait;
    use sbtn_sdk::objects::Envelope;
    use std::sync::Mutex;
    use time::OffsetDateTime;
    use url::Url;

    struct NullEventRepository;

    #[async_trait]
    impl EventRepository for NullEventRepository {
        async fn save(&self, _event: &Envelope) -> Result<(), RepositoryError> {
            Ok(())
        }

        async fn fetch_all(&self) -> Result<Vec<Envelope>, RepositoryError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct MemoryQueue {
        tasks: Mutex<Vec<Task>>,
        fail: bool,
    }

    #[async_trait]
    impl PushQueue for MemoryQueue {
        async fn enqueue(&self, task: Task) -> Result<String, QueueError> {
            if self.fail {
                return Err(QueueError::Closed);
            }
            self.tasks.lock().unwrap().push(task);
            Ok("task".to_string())
        }
    }

    impl MemoryQueue {
        fn events(&self) -> Vec<Envelope> {
            self.tasks
                .lock()
                .unwrap()
                .iter()
                .map(|task| serde_json::from_slice(&task.body).unwrap())
                .collect()
        }
    }

    fn service(records: Vec<ProjectIntegration>, queue: Arc<MemoryQueue>) -> ProjectIntegrationService {
        let dispatcher = EventDispatcher::new(
            Arc::new(NullEventRepository),
            queue,
            Url::parse("https://api.example.com/v1/events/consume").unwrap(),
        );
        ProjectIntegrationService::new(
            Arc::new(MemoryOrdering {
                records: Mutex::new(records),
            }),
            Arc::new(dispatcher),
            "superbutton-api",
        )
    }

    struct MemoryOrdering {
        records: Mutex<Vec<ProjectIntegration>>,
    }

    #[async_trait]
    impl ProjectIntegrationRepository for MemoryOrdering {
        async fn fetch(
            &self,
            user_id: &UserId,
            project_id: Uuid,
        ) -> Result<Vec<ProjectIntegration>, RepositoryError> {
            let mut records: Vec<_> = self
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|r| &r.user_id == user_id && r.project_id == project_id)
                .cloned()
                .collect();
            records.sort_by_key(|r| r.position);
            Ok(records)
        }

        async fn update_positions(
            &self,
            user_id: &UserId,
            integration_ids: &[Uuid],
        ) -> Result<(), RepositoryError> {
            let mut records = self.records.lock().unwrap();
            for (position, id) in integration_ids.iter().enumerate() {
                for record in records.iter_mut() {
                    if &record.user_id == user_id && record.integration_id == *id {
                        record.position = position as i32;
                    }
                }
            }
            Ok(())
        }
    }

    fn record(project_id: Uuid, position: i32) -> ProjectIntegration {
        ProjectIntegration {
            id: Uuid::new_v4(),
            user_id: UserId::new("user-1"),
            project_id,
            integration_id: Uuid::new_v4(),
            integration_type: IntegrationType::Link,
            name: format!("link {position}"),
            position,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[tokio::test]
    async fn test_update_positions_reorders() {
        let project_id = Uuid::new_v4();
        let records = vec![
            record(project_id, 0),
            record(project_id, 1),
            record(project_id, 2),
        ];
        let ids: Vec<Uuid> = records.iter().map(|r| r.integration_id).collect();
        let service = service(records, Default::default());

        let reordered = [ids[2], ids[0], ids[1]];
        let updated = service
            .update_positions(&UserId::new("user-1"), project_id, &reordered)
            .await
            .unwrap();
        let order: Vec<Uuid> = updated.iter().map(|r| r.integration_id).collect();
        assert_eq!(order, reordered);
        assert_eq!(
            updated.iter().map(|r| r.position).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[tokio::test]
    async fn test_update_positions_rejects_bad_input() {
        let queue = Arc::new(MemoryQueue::default());
        let service = service(Vec::new(), queue.clone());
        let user_id = UserId::new("user-1");

        let empty = service
            .update_positions(&user_id, Uuid::new_v4(), &[])
            .await;
        assert!(matches!(empty, Err(ProjectIntegrationError::Empty)));

        let id = Uuid::new_v4();
        let duplicate = service
            .update_positions(&user_id, Uuid::new_v4(), &[id, id])
            .await;
        assert!(matches!(duplicate, Err(ProjectIntegrationError::Duplicate(d)) if d == id));
        assert!(queue.tasks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_positions_announces_moved_integrations() {
        let project_id = Uuid::new_v4();
        let records = vec![
            record(project_id, 0),
            record(project_id, 1),
            record(project_id, 2),
        ];
        let ids: Vec<Uuid> = records.iter().map(|r| r.integration_id).collect();
        let queue = Arc::new(MemoryQueue::default());
        let service = service(records, queue.clone());

        service
            .update_positions(&UserId::new("user-1"), project_id, &[ids[0], ids[2], ids[1]])
            .await
            .unwrap();

        let events = queue.events();
        assert_eq!(events.len(), 2);
        let mut moved: Vec<Uuid> = events
            .iter()
            .map(|event| {
                assert_eq!(event.event_type, INTEGRATION_UPDATED);
                assert_eq!(event.source, "superbutton-api");
                event
                    .data_as::<IntegrationUpdatedPayload>()
                    .unwrap()
                    .integration_id
            })
            .collect();
        moved.sort();
        let mut expected = vec![ids[1], ids[2]];
        expected.sort();
        assert_eq!(moved, expected);
    }

    #[tokio::test]
    async fn test_update_positions_survives_queue_failure() {
        let project_id = Uuid::new_v4();
        let records = vec![record(project_id, 0), record(project_id, 1)];
        let ids: Vec<Uuid> = records.iter().map(|r| r.integration_id).collect();
        let queue = Arc::new(MemoryQueue {
            fail: true,
            ..Default::default()
        });
        let service = service(records, queue);

        let updated = service
            .update_positions(&UserId::new("user-1"), project_id, &[ids[1], ids[0]])
            .await
            .unwrap();
        assert_eq!(updated[0].integration_id, ids[1]);
    }
}
