use crate::stores::{ParticipantStore, StoreError, map_unique_violation};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// A per-event identity admitted into an event.
///
/// `user_id` is `None` for guests. Never mutated after admission.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Participant {
    pub id: String,
    pub event_id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub joined_at: time::PrimitiveDateTime,
}

/// Insert shape for a participant; the id is generated by the caller.
#[derive(Debug, Clone)]
pub struct NewParticipant {
    pub id: String,
    pub event_id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
}

const PARTICIPANT_COLUMNS: &str = "id, event_id, user_id, name, joined_at";

/// Postgres-backed [`ParticipantStore`].
#[derive(Clone)]
pub struct PgParticipantStore {
    pool: PgPool,
}

impl PgParticipantStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParticipantStore for PgParticipantStore {
    #[tracing::instrument(skip_all, err, name = "SQL:CreateParticipant")]
    async fn create(&self, new: NewParticipant) -> Result<Participant, StoreError> {
        sqlx::query_as::<_, Participant>(&format!(
            "INSERT INTO participants (id, event_id, user_id, name) \
             VALUES ($1, $2, $3, $4) RETURNING {PARTICIPANT_COLUMNS}"
        ))
        .bind(&new.id)
        .bind(new.event_id)
        .bind(new.user_id)
        .bind(&new.name)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)
    }

    #[tracing::instrument(skip_all, err, name = "SQL:FindParticipantById")]
    async fn find_by_id(&self, participant_id: &str) -> Result<Option<Participant>, StoreError> {
        let participant = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE id = $1"
        ))
        .bind(participant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(participant)
    }

    #[tracing::instrument(skip_all, err, name = "SQL:FindParticipantByUser")]
    async fn find_by_user(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participant>, StoreError> {
        let participant = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants \
             WHERE event_id = $1 AND user_id = $2"
        ))
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(participant)
    }

    #[tracing::instrument(skip_all, err, name = "SQL:FindParticipantByName")]
    async fn find_by_name(
        &self,
        event_id: Uuid,
        name: &str,
    ) -> Result<Option<Participant>, StoreError> {
        let participant = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants \
             WHERE event_id = $1 AND name = $2"
        ))
        .bind(event_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(participant)
    }

    #[tracing::instrument(skip_all, err, name = "SQL:ListParticipantsForEvent")]
    async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<Participant>, StoreError> {
        let participants = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants \
             WHERE event_id = $1 ORDER BY joined_at, id"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(participants)
    }

    #[tracing::instrument(skip_all, err, name = "SQL:DeleteParticipant")]
    async fn delete(&self, participant_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM participants WHERE id = $1")
            .bind(participant_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
