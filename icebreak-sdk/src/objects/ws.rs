//! WebSocket frame types for the live join feed.

use super::join::ParticipantResponse;
use serde::{Deserialize, Serialize};

/// Close codes used by the join-feed WebSocket.
pub struct WsCloseCode;

impl WsCloseCode {
    /// The event does not exist.
    pub const EVENT_NOT_FOUND: u16 = 4004;
    /// Server-side failure while serving the feed.
    pub const INTERNAL_ERROR: u16 = 1011;
}

/// Server-to-client frames on the join feed.
///
/// The first frame is always a `snapshot` of the current participants;
/// after a reported lag the server sends a fresh snapshot before resuming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsServerMessage {
    Snapshot {
        participants: Vec<ParticipantResponse>,
    },
    ParticipantJoined {
        participant_id: String,
        name: String,
    },
    Error {
        code: u16,
        reason: String,
    },
}
