use kanau::processor::Processor;
use sbtn_sdk::objects::ProjectResponse;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::entities::UserId;
use crate::framework::DatabaseProcessor;

/// A configured widget site.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,
    pub user_id: UserId,
    pub name: String,
    pub url: String,
    pub icon: String,
    pub greeting: String,
    pub color: String,
    pub greeting_timeout_seconds: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<Project> for ProjectResponse {
    fn from(value: Project) -> Self {
        ProjectResponse {
            id: value.id,
            user_id: value.user_id.0,
            name: value.name,
            url: value.url,
            icon: value.icon,
            greeting: value.greeting,
            color: value.color,
            greeting_timeout_seconds: value.greeting_timeout_seconds,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// Load a project owned by the given user.
#[derive(Debug, Clone)]
pub struct GetProjectById {
    pub user_id: UserId,
    pub project_id: Uuid,
}

impl Processor<GetProjectById> for DatabaseProcessor {
    type Output = Option<Project>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetProjectById")]
    async fn process(&self, query: GetProjectById) -> Result<Option<Project>, sqlx::Error> {
        let GetProjectById {
            user_id,
            project_id,
        } = query;
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, user_id, name, url, icon, greeting, color,
                greeting_timeout_seconds, created_at, updated_at
            FROM projects
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }
}
