use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use sbtn_core::entities::link_integration::LinkIntegration;
use sbtn_core::entities::project::Project;
use sbtn_core::entities::project_integration::ProjectIntegration;
use sbtn_core::entities::{IntegrationDetail, IntegrationType, UserId};
use sbtn_core::processors::{
    EventDispatcher, EventListener, ProjectIntegrationService, ProjectSettingsService,
};
use sbtn_core::queue::{PushQueue, QueueError, Task};
use sbtn_core::repositories::{
    EventRepository, IntegrationRepository, ProjectIntegrationRepository, ProjectRepository,
    RepositoryError,
};
use sbtn_sdk::objects::Envelope;
use sbtn_sdk::signature::{SIGNATURE_HEADER, sign_body};
use time::OffsetDateTime;
use tower::ServiceExt;
use url::Url;
use uuid::Uuid;

use crate::api::extractors::USER_ID_HEADER;
use crate::server::build_router;
use crate::state::AppState;

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

struct NullQueue;

#[async_trait]
impl PushQueue for NullQueue {
    async fn enqueue(&self, _task: Task) -> Result<String, QueueError> {
        Ok("task-1".to_string())
    }
}

#[derive(Default)]
struct CountingListener {
    calls: AtomicUsize,
}

#[async_trait]
impl EventListener for CountingListener {
    fn name(&self) -> &str {
        "counting"
    }

    async fn handle(&self, _event: &Envelope) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("listener failures never reach the queue")
    }
}

struct Fixture {
    user_id: UserId,
    project_id: Uuid,
    first: Uuid,
    second: Uuid,
}

impl Fixture {
    fn new() -> Self {
        Self {
            user_id: UserId::new("user-1"),
            project_id: Uuid::new_v4(),
            first: Uuid::new_v4(),
            second: Uuid::new_v4(),
        }
    }

    fn project(&self) -> Project {
        Project {
            id: self.project_id,
            user_id: self.user_id.clone(),
            name: "Acme".to_string(),
            url: "https://acme.test".to_string(),
            icon: "chat".to_string(),
            greeting: "Hi there".to_string(),
            color: "#283593".to_string(),
            greeting_timeout_seconds: 30,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn records(&self) -> Vec<ProjectIntegration> {
        [(self.second, 0), (self.first, 1)]
            .into_iter()
            .map(|(integration_id, position)| ProjectIntegration {
                id: Uuid::new_v4(),
                user_id: self.user_id.clone(),
                project_id: self.project_id,
                integration_id,
                integration_type: IntegrationType::Link,
                name: format!("link {position}"),
                position,
                created_at: OffsetDateTime::UNIX_EPOCH,
                updated_at: OffsetDateTime::UNIX_EPOCH,
            })
            .collect()
    }

    fn links(&self) -> Vec<IntegrationDetail> {
        [self.first, self.second]
            .into_iter()
            .map(|id| {
                IntegrationDetail::Link(LinkIntegration {
                    id,
                    user_id: self.user_id.clone(),
                    project_id: self.project_id,
                    enabled: true,
                    name: "Docs".to_string(),
                    text: "Read the docs".to_string(),
                    url: format!("https://acme.test/{id}"),
                    icon: "link".to_string(),
                    created_at: OffsetDateTime::UNIX_EPOCH,
                    updated_at: OffsetDateTime::UNIX_EPOCH,
                })
            })
            .collect()
    }
}

struct MemoryProjects(Project);

#[async_trait]
impl ProjectRepository for MemoryProjects {
    async fn load(&self, user_id: &UserId, project_id: Uuid) -> Result<Project, RepositoryError> {
        if self.0.id == project_id && &self.0.user_id == user_id {
            Ok(self.0.clone())
        } else {
            Err(RepositoryError::NotFound {
                entity: "project",
                id: project_id.to_string(),
            })
        }
    }
}

struct MemoryOrdering(Mutex<Vec<ProjectIntegration>>);

#[async_trait]
impl ProjectIntegrationRepository for MemoryOrdering {
    async fn fetch(
        &self,
        user_id: &UserId,
        project_id: Uuid,
    ) -> Result<Vec<ProjectIntegration>, RepositoryError> {
        let mut records: Vec<_> = self
            .0
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
        _user_id: &UserId,
        integration_ids: &[Uuid],
    ) -> Result<(), RepositoryError> {
        let mut records = self.0.lock().unwrap();
        for (position, id) in integration_ids.iter().enumerate() {
            if let Some(record) = records.iter_mut().find(|r| r.integration_id == *id) {
                record.position = position as i32;
            }
        }
        Ok(())
    }
}

struct MemoryLinks(Vec<IntegrationDetail>);

#[async_trait]
impl IntegrationRepository for MemoryLinks {
    fn integration_type(&self) -> IntegrationType {
        IntegrationType::Link
    }

    async fn fetch(
        &self,
        _user_id: &UserId,
        _project_id: Uuid,
    ) -> Result<Vec<IntegrationDetail>, RepositoryError> {
        Ok(self.0.clone())
    }

    async fn fetch_multiple(
        &self,
        _user_id: &UserId,
        integration_ids: &[Uuid],
    ) -> Result<Vec<IntegrationDetail>, RepositoryError> {
        Ok(self
            .0
            .iter()
            .filter(|d| integration_ids.contains(&d.id()))
            .cloned()
            .collect())
    }
}

fn app(
    fixture: &Fixture,
    listener: Arc<CountingListener>,
    signing_secret: Option<&[u8]>,
) -> Router {
    let mut dispatcher = EventDispatcher::new(
        Arc::new(NullEventRepository),
        Arc::new(NullQueue),
        Url::parse("http://localhost/v1/events/consume").unwrap(),
    );
    dispatcher.subscribe("user.created", listener);

    let ordering = Arc::new(MemoryOrdering(Mutex::new(fixture.records())));
    let settings = ProjectSettingsService::new(
        Arc::new(MemoryProjects(fixture.project())),
        ordering.clone(),
        [Arc::new(MemoryLinks(fixture.links())) as Arc<dyn IntegrationRepository>],
    );

    let dispatcher = Arc::new(dispatcher);
    build_router(AppState {
        project_integrations: Arc::new(ProjectIntegrationService::new(
            ordering,
            dispatcher.clone(),
            "superbutton-api",
        )),
        dispatcher,
        settings: Arc::new(settings),
        signing_secret: signing_secret.map(Arc::<[u8]>::from),
    })
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn user_created() -> Vec<u8> {
    let event = Envelope::new(
        "user.created",
        "/v1/users",
        &serde_json::json!({ "id": "user-1" }),
    )
    .unwrap();
    serde_json::to_vec(&event).unwrap()
}

fn consume_request(body: Vec<u8>, signature: Option<String>) -> Request<Body> {
    let mut builder = Request::post("/v1/events/consume").header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }
    builder.body(Body::from(body)).unwrap()
}

#[tokio::test]
async fn test_health() {
    let fixture = Fixture::new();
    let response = app(&fixture, Default::default(), None)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "sbtn-server");
    assert_eq!(json["event_types"], serde_json::json!(["user.created"]));
    assert_eq!(json["integration_types"], serde_json::json!(["link"]));
}

#[tokio::test]
async fn test_consume_publishes_and_ignores_listener_failure() {
    let fixture = Fixture::new();
    let listener = Arc::new(CountingListener::default());
    let response = app(&fixture, listener.clone(), None)
        .oneshot(consume_request(user_created(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(listener.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_consume_rejects_invalid_event() {
    let fixture = Fixture::new();
    let listener = Arc::new(CountingListener::default());
    let body = br#"{"specversion":"1.0","type":"user.created","id":"","source":"/v1/users"}"#;
    let response = app(&fixture, listener.clone(), None)
        .oneshot(consume_request(body.to_vec(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["errors"]["event"].as_array().unwrap().len(), 2);
    assert_eq!(listener.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_consume_rejects_malformed_json() {
    let fixture = Fixture::new();
    let response = app(&fixture, Default::default(), None)
        .oneshot(consume_request(b"not json".to_vec(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_consume_verifies_signature() {
    let fixture = Fixture::new();
    let listener = Arc::new(CountingListener::default());
    let secret = b"s3cret";

    let unsigned = app(&fixture, listener.clone(), Some(secret))
        .oneshot(consume_request(user_created(), None))
        .await
        .unwrap();
    assert_eq!(unsigned.status(), StatusCode::UNAUTHORIZED);

    let body = user_created();
    let forged = sign_body(&body, b"wrong");
    let response = app(&fixture, listener.clone(), Some(secret))
        .oneshot(consume_request(body, Some(forged)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(listener.calls.load(Ordering::SeqCst), 0);

    let body = user_created();
    let signature = sign_body(&body, secret);
    let response = app(&fixture, listener.clone(), Some(secret))
        .oneshot(consume_request(body, Some(signature)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(listener.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_settings_are_ordered() {
    let fixture = Fixture::new();
    let response = app(&fixture, Default::default(), None)
        .oneshot(
            Request::get(format!("/v1/projects/{}/settings", fixture.project_id))
                .header(USER_ID_HEADER, "user-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["project"]["name"], "Acme");
    assert_eq!(json["integrations"][0]["id"], fixture.second.to_string());
    assert_eq!(json["integrations"][0]["type"], "link");
    assert_eq!(json["integrations"][1]["id"], fixture.first.to_string());
}

#[tokio::test]
async fn test_settings_require_caller() {
    let fixture = Fixture::new();
    let response = app(&fixture, Default::default(), None)
        .oneshot(
            Request::get(format!("/v1/projects/{}/settings", fixture.project_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_settings_of_unknown_project_is_not_found() {
    let fixture = Fixture::new();
    let response = app(&fixture, Default::default(), None)
        .oneshot(
            Request::get(format!("/v1/projects/{}/settings", Uuid::new_v4()))
                .header(USER_ID_HEADER, "user-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_positions() {
    let fixture = Fixture::new();
    let app = app(&fixture, Default::default(), None);
    let uri = format!("/v1/projects/{}/integrations", fixture.project_id);

    let body = serde_json::json!({ "integrations": [fixture.first, fixture.second] });
    let response = app
        .clone()
        .oneshot(
            Request::put(&uri)
                .header(USER_ID_HEADER, "user-1")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json[0]["integration_id"], fixture.first.to_string());
    assert_eq!(json[0]["position"], 0);

    let listed = app
        .oneshot(
            Request::get(&uri)
                .header(USER_ID_HEADER, "user-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(listed).await;
    assert_eq!(json[1]["integration_id"], fixture.second.to_string());
}

#[tokio::test]
async fn test_update_positions_rejects_empty_list() {
    let fixture = Fixture::new();
    let response = app(&fixture, Default::default(), None)
        .oneshot(
            Request::put(format!("/v1/projects/{}/integrations", fixture.project_id))
                .header(USER_ID_HEADER, "user-1")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"integrations":[]}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
