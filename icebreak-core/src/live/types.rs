//! Frame types for the live join feed.
//!
//! Frames are ephemeral and carry only identifiers plus the display name;
//! observers needing full state re-read it through the stores.

use uuid::Uuid;

/// Published after a successful admission, once per new participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantJoined {
    /// Channel scope: only observers of this event see the frame.
    pub event_id: Uuid,
    pub participant_id: String,
    pub name: String,
}
