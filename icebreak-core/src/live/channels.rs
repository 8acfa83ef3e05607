//! Join-feed channel factory and handles.

use super::types::ParticipantJoined;
use tokio::sync::broadcast;

/// Default buffer size for the join-feed channel.
///
/// Enough to absorb admission bursts; observers that fall further behind
/// are told they lagged and re-snapshot.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for ParticipantJoined frames.
pub type JoinSender = broadcast::Sender<ParticipantJoined>;
/// Receiver handle for ParticipantJoined frames.
pub type JoinReceiver = broadcast::Receiver<ParticipantJoined>;

/// Create a new join-feed channel with the default buffer.
///
/// One channel serves the whole process; frames carry their event id and
/// subscribers filter on it.
pub fn join_channel() -> (JoinSender, JoinReceiver) {
    broadcast::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Create a join-feed channel with an explicit buffer size.
pub fn join_channel_with_buffer(buffer: usize) -> (JoinSender, JoinReceiver) {
    broadcast::channel(buffer.max(1))
}
