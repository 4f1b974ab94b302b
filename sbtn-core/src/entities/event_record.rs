use kanau::processor::Processor;
use sqlx::types::Json;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::framework::DatabaseProcessor;

/// A stored event. `data` holds the complete envelope as JSON.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct EventRecord {
    pub id: Uuid,
    pub time: OffsetDateTime,
    pub created_at: OffsetDateTime,
    pub source: String,
    #[sqlx(rename = "type")]
    pub event_type: String,
    pub data: Json<serde_json::Value>,
}

/// Insert an event, or overwrite the stored copy when the id is already known.
#[derive(Debug, Clone)]
pub struct UpsertEventRecord {
    pub id: Uuid,
    pub time: OffsetDateTime,
    pub source: String,
    pub event_type: String,
    pub data: serde_json::Value,
}

impl Processor<UpsertEventRecord> for DatabaseProcessor {
    type Output = ();
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:UpsertEventRecord")]
    async fn process(&self, insert: UpsertEventRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO events (id, time, source, type, data)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET time = EXCLUDED.time,
                source = EXCLUDED.source,
                type = EXCLUDED.type,
                data = EXCLUDED.data
            "#,
        )
        .bind(insert.id)
        .bind(insert.time)
        .bind(insert.source)
        .bind(insert.event_type)
        .bind(Json(insert.data))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Every stored event, oldest first.
#[derive(Debug, Clone, Copy)]
pub struct GetAllEventRecords;

impl Processor<GetAllEventRecords> for DatabaseProcessor {
    type Output = Vec<EventRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetAllEventRecords")]
    async fn process(&self, _: GetAllEventRecords) -> Result<Vec<EventRecord>, sqlx::Error> {
        sqlx::query_as::<_, EventRecord>(
            r#"
            SELECT id, time, created_at, source, type, data
            FROM events
            ORDER BY time ASC, created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }
}
