//! Store traits — the persistence seams of the core.
//!
//! All serialization between concurrent requests comes from the stores:
//! unique indexes and the atomic conditional registration. The services
//! never hold in-process locks.

use crate::entities::connections::{Connection, NewConnection};
use crate::entities::events::EventRecord;
use crate::entities::participants::{NewParticipant, Participant};
use crate::entities::users::UserRecord;
use crate::ids::JoinCode;
use async_trait::async_trait;
use uuid::Uuid;

/// Storage-level unique constraints the services react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueKey {
    /// `(event_id, name)` on participants.
    ParticipantName,
    /// `(event_id, user_id)` on participants, registered users only.
    ParticipantUser,
    /// `(event_id, primary_id, secondary_id)` on either connection table.
    ConnectionPair,
    /// `join_code` on events.
    EventJoinCode,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0:?}")]
    UniqueViolation(UniqueKey),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result of the atomic add-if-absent registration of a participant id
/// into an event's membership set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// This call performed the insertion.
    Added,
    /// The set already contained the id; nothing was written.
    AlreadyPresent,
    /// The event is at capacity; nothing was written.
    Full,
    /// The event row disappeared between the pre-check and the write.
    EventMissing,
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn find_by_id(&self, event_id: Uuid) -> Result<Option<EventRecord>, StoreError>;

    async fn find_by_join_code(&self, code: &JoinCode) -> Result<Option<EventRecord>, StoreError>;

    async fn join_code_taken(&self, code: &JoinCode) -> Result<bool, StoreError>;

    /// Register a participant id into the event's membership set.
    ///
    /// Must be a single atomic conditional operation: the capacity counter
    /// and the set insert are checked and written together, so the
    /// `participant_count <= max_participants` invariant holds strictly
    /// under concurrent registrations.
    async fn register_participant(
        &self,
        event_id: Uuid,
        participant_id: &str,
    ) -> Result<RegisterOutcome, StoreError>;

    /// Membership set in insertion order (display order).
    async fn list_participant_ids(&self, event_id: Uuid) -> Result<Vec<String>, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserRecord>, StoreError>;

    /// Lookup by normalized (trimmed, lowercased) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn exists(&self, user_id: Uuid) -> Result<bool, StoreError>;

    /// Append an event id to the user's history set if absent.
    ///
    /// Best-effort denormalization: callers log failures and carry on.
    async fn append_event_history(&self, user_id: Uuid, event_id: Uuid) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ParticipantStore: Send + Sync {
    /// Create a participant. The `(event_id, name)` and `(event_id, user_id)`
    /// unique constraints are enforced here, at the storage level, and
    /// surfaced as [`StoreError::UniqueViolation`].
    async fn create(&self, new: NewParticipant) -> Result<Participant, StoreError>;

    async fn find_by_id(&self, participant_id: &str) -> Result<Option<Participant>, StoreError>;

    async fn find_by_user(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participant>, StoreError>;

    async fn find_by_name(
        &self,
        event_id: Uuid,
        name: &str,
    ) -> Result<Option<Participant>, StoreError>;

    /// Participants of an event in admission order.
    async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<Participant>, StoreError>;

    /// Compensating removal for a participant whose registration lost the
    /// race. Not exposed over HTTP.
    async fn delete(&self, participant_id: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Insert a connection. The `(event_id, primary_id, secondary_id)`
    /// unique index closes the check-then-insert race.
    async fn insert(&self, new: NewConnection) -> Result<Connection, StoreError>;

    /// Exact ordered-pair lookup.
    async fn find_by_pair(
        &self,
        event_id: Uuid,
        primary_id: &str,
        secondary_id: &str,
    ) -> Result<Option<Connection>, StoreError>;

    /// Delete by id, only when the record belongs to `event_id`.
    /// Returns the deleted record.
    async fn delete(
        &self,
        event_id: Uuid,
        connection_id: &str,
    ) -> Result<Option<Connection>, StoreError>;

    /// All connections in the event where the endpoint appears on either
    /// side, in creation order.
    async fn list_by_endpoint(
        &self,
        event_id: Uuid,
        endpoint_id: &str,
    ) -> Result<Vec<Connection>, StoreError>;
}

/// Translate a violated unique index into a typed store error.
///
/// Index names here must match the migrations.
pub(crate) fn map_unique_violation(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db) = e {
        match db.constraint() {
            Some("uq_participants_event_name") => {
                return StoreError::UniqueViolation(UniqueKey::ParticipantName);
            }
            Some("uq_participants_event_user") => {
                return StoreError::UniqueViolation(UniqueKey::ParticipantUser);
            }
            Some("uq_user_connections_event_pair")
            | Some("uq_participant_connections_event_pair") => {
                return StoreError::UniqueViolation(UniqueKey::ConnectionPair);
            }
            Some("uq_events_join_code") => {
                return StoreError::UniqueViolation(UniqueKey::EventJoinCode);
            }
            _ => {}
        }
    }
    StoreError::Database(e)
}
