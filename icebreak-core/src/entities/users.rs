use crate::stores::{StoreError, UserStore};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Minimal view of a user record.
///
/// Signup, credentials and profile management live outside this core; the
/// admission and connection paths only need id, email and display name.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

/// Postgres-backed [`UserStore`].
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    #[tracing::instrument(skip_all, err, name = "SQL:FindUserById")]
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let user =
            sqlx::query_as::<_, UserRecord>("SELECT id, email, name FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    #[tracing::instrument(skip_all, err, name = "SQL:FindUserByEmail")]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let user =
            sqlx::query_as::<_, UserRecord>("SELECT id, email, name FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    #[tracing::instrument(skip_all, err, name = "SQL:UserExists")]
    async fn exists(&self, user_id: Uuid) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    #[tracing::instrument(skip_all, err, name = "SQL:AppendEventHistory")]
    async fn append_event_history(&self, user_id: Uuid, event_id: Uuid) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE users SET event_history = array_append(event_history, $2) \
             WHERE id = $1 AND NOT (event_history @> ARRAY[$2])",
        )
        .bind(user_id)
        .bind(event_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
