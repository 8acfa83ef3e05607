//! Join request and participant response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for joining an event as a registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinAsUserRequest {
    pub user_id: Uuid,
    /// Display name for this event.
    pub name: String,
}

/// Request body for joining an event as a guest.
///
/// Guests have no backing user record; the display name is their whole
/// identity within the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinAsGuestRequest {
    pub name: String,
}

/// A participant admitted into an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantResponse {
    pub id: String,
    pub event_id: Uuid,
    /// `None` for guests.
    pub user_id: Option<Uuid>,
    pub name: String,
    /// Unix timestamp (seconds).
    pub joined_at: i64,
}
