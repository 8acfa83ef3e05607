//! Connection request and response types.
//!
//! The same bodies serve both connection variants; the route selects
//! whether endpoints are user ids or participant ids.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Create a connection between two already-known endpoint ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateConnectionRequest {
    pub primary_id: String,
    pub secondary_id: String,
    /// Free text, e.g. the icebreaker prompt that produced the connection.
    #[serde(default)]
    pub description: Option<String>,
}

/// Create a connection addressed by the endpoints' emails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateConnectionByEmailRequest {
    pub primary_email: String,
    pub secondary_email: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A recorded connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionResponse {
    pub id: String,
    pub event_id: Uuid,
    pub primary_id: String,
    pub secondary_id: String,
    pub description: Option<String>,
    /// Unix timestamp (seconds).
    pub created_at: i64,
}
