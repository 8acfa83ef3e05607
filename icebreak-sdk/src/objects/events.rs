//! Event response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of an event, as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventState {
    Upcoming,
    InProgress,
    Completed,
}

/// An event, as returned by the join-code lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub join_code: String,
    /// Unix timestamps (seconds).
    pub start_at: i64,
    pub end_at: i64,
    pub max_participants: i32,
    pub participant_count: i32,
    pub state: EventState,
    pub created_by: Uuid,
}
