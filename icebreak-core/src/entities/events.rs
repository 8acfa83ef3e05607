use super::EventState;
use crate::ids::JoinCode;
use crate::stores::{EventStore, RegisterOutcome, StoreError};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct EventRecord {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub join_code: String,
    pub start_at: time::PrimitiveDateTime,
    pub end_at: time::PrimitiveDateTime,
    pub max_participants: i32,
    pub participant_count: i32,
    pub state: EventState,
    pub created_by: Uuid,
    pub created_at: time::PrimitiveDateTime,
}

const EVENT_COLUMNS: &str = "id, name, description, join_code, start_at, end_at, \
     max_participants, participant_count, state, created_by, created_at";

/// Postgres-backed [`EventStore`].
#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    #[tracing::instrument(skip_all, err, name = "SQL:FindEventById")]
    async fn find_by_id(&self, event_id: Uuid) -> Result<Option<EventRecord>, StoreError> {
        let event = sqlx::query_as::<_, EventRecord>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }

    #[tracing::instrument(skip_all, err, name = "SQL:FindEventByJoinCode")]
    async fn find_by_join_code(&self, code: &JoinCode) -> Result<Option<EventRecord>, StoreError> {
        let event = sqlx::query_as::<_, EventRecord>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE join_code = $1"
        ))
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }

    #[tracing::instrument(skip_all, err, name = "SQL:JoinCodeTaken")]
    async fn join_code_taken(&self, code: &JoinCode) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM events WHERE join_code = $1")
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// The capacity counter and the membership insert run in one
    /// transaction; the counter update takes a row lock on the event, so
    /// concurrent registrations serialize there and the count can never
    /// exceed `max_participants`.
    #[tracing::instrument(skip_all, err, name = "SQL:RegisterParticipant")]
    async fn register_participant(
        &self,
        event_id: Uuid,
        participant_id: &str,
    ) -> Result<RegisterOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let counted = sqlx::query(
            "UPDATE events SET participant_count = participant_count + 1 \
             WHERE id = $1 AND participant_count < max_participants",
        )
        .bind(event_id)
        .execute(&mut *tx)
        .await?;

        if counted.rows_affected() == 0 {
            let exists = sqlx::query("SELECT 1 FROM events WHERE id = $1")
                .bind(event_id)
                .fetch_optional(&mut *tx)
                .await?;
            tx.rollback().await?;
            return Ok(if exists.is_some() {
                RegisterOutcome::Full
            } else {
                RegisterOutcome::EventMissing
            });
        }

        let inserted = sqlx::query(
            "INSERT INTO event_participants (event_id, participant_id) \
             VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(event_id)
        .bind(participant_id)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            // Set semantics: the id was already present, so the counter
            // increment must not survive either.
            tx.rollback().await?;
            return Ok(RegisterOutcome::AlreadyPresent);
        }

        tx.commit().await?;
        Ok(RegisterOutcome::Added)
    }

    #[tracing::instrument(skip_all, err, name = "SQL:ListParticipantIds")]
    async fn list_participant_ids(&self, event_id: Uuid) -> Result<Vec<String>, StoreError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT participant_id FROM event_participants \
             WHERE event_id = $1 ORDER BY registered_at, participant_id",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}
