use crate::ids;
use crate::stores::{ConnectionStore, StoreError, map_unique_violation};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Which entity type a connection's endpoints reference.
///
/// Both variants share shape and rules; they differ only in endpoint
/// validation and in which table backs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionKind {
    /// Endpoints are user ids (global scope).
    User,
    /// Endpoints are participant ids (scoped to the event).
    Participant,
}

impl ConnectionKind {
    pub fn id_prefix(self) -> &'static str {
        match self {
            ConnectionKind::User => ids::USER_CONNECTION_ID_PREFIX,
            ConnectionKind::Participant => ids::PARTICIPANT_CONNECTION_ID_PREFIX,
        }
    }

    fn table(self) -> &'static str {
        match self {
            ConnectionKind::User => "user_connections",
            ConnectionKind::Participant => "participant_connections",
        }
    }
}

/// A recorded pairwise relationship between two endpoints in one event.
///
/// Storage keeps the pair ordered; queries treat it as symmetric.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Connection {
    pub id: String,
    pub event_id: Uuid,
    pub primary_id: String,
    pub secondary_id: String,
    pub description: Option<String>,
    pub created_at: time::PrimitiveDateTime,
}

/// Insert shape for a connection; the id is generated by the caller.
#[derive(Debug, Clone)]
pub struct NewConnection {
    pub id: String,
    pub event_id: Uuid,
    pub primary_id: String,
    pub secondary_id: String,
    pub description: Option<String>,
}

const CONNECTION_COLUMNS: &str = "id, event_id, primary_id, secondary_id, description, created_at";

/// Postgres-backed [`ConnectionStore`] over one of the two connection
/// tables, selected by [`ConnectionKind`].
#[derive(Clone)]
pub struct PgConnectionStore {
    pool: PgPool,
    kind: ConnectionKind,
}

impl PgConnectionStore {
    pub fn new(pool: PgPool, kind: ConnectionKind) -> Self {
        Self { pool, kind }
    }
}

#[async_trait]
impl ConnectionStore for PgConnectionStore {
    #[tracing::instrument(skip_all, err, name = "SQL:InsertConnection")]
    async fn insert(&self, new: NewConnection) -> Result<Connection, StoreError> {
        sqlx::query_as::<_, Connection>(&format!(
            "INSERT INTO {} (id, event_id, primary_id, secondary_id, description) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {CONNECTION_COLUMNS}",
            self.kind.table()
        ))
        .bind(&new.id)
        .bind(new.event_id)
        .bind(&new.primary_id)
        .bind(&new.secondary_id)
        .bind(&new.description)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)
    }

    #[tracing::instrument(skip_all, err, name = "SQL:FindConnectionByPair")]
    async fn find_by_pair(
        &self,
        event_id: Uuid,
        primary_id: &str,
        secondary_id: &str,
    ) -> Result<Option<Connection>, StoreError> {
        let connection = sqlx::query_as::<_, Connection>(&format!(
            "SELECT {CONNECTION_COLUMNS} FROM {} \
             WHERE event_id = $1 AND primary_id = $2 AND secondary_id = $3",
            self.kind.table()
        ))
        .bind(event_id)
        .bind(primary_id)
        .bind(secondary_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(connection)
    }

    #[tracing::instrument(skip_all, err, name = "SQL:DeleteConnection")]
    async fn delete(
        &self,
        event_id: Uuid,
        connection_id: &str,
    ) -> Result<Option<Connection>, StoreError> {
        let deleted = sqlx::query_as::<_, Connection>(&format!(
            "DELETE FROM {} WHERE event_id = $1 AND id = $2 RETURNING {CONNECTION_COLUMNS}",
            self.kind.table()
        ))
        .bind(event_id)
        .bind(connection_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(deleted)
    }

    #[tracing::instrument(skip_all, err, name = "SQL:ListConnectionsByEndpoint")]
    async fn list_by_endpoint(
        &self,
        event_id: Uuid,
        endpoint_id: &str,
    ) -> Result<Vec<Connection>, StoreError> {
        let connections = sqlx::query_as::<_, Connection>(&format!(
            "SELECT {CONNECTION_COLUMNS} FROM {} \
             WHERE event_id = $1 AND (primary_id = $2 OR secondary_id = $2) \
             ORDER BY created_at, id",
            self.kind.table()
        ))
        .bind(event_id)
        .bind(endpoint_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(connections)
    }
}
