//! Live join feed.
//!
//! Delivery is at-most-once and best-effort: observers connected at publish
//! time each receive the frame once; there is no replay log, and zero
//! observers is not a failure. Missed frames are reconciled by re-reading
//! the participant list.

pub mod channels;
pub mod types;

pub use channels::{DEFAULT_CHANNEL_BUFFER, JoinReceiver, JoinSender, join_channel};
pub use types::ParticipantJoined;

use uuid::Uuid;

/// Publisher handle for the join feed.
#[derive(Clone)]
pub struct JoinNotifier {
    tx: JoinSender,
}

impl JoinNotifier {
    pub fn new() -> Self {
        let (tx, _rx) = channels::join_channel();
        Self { tx }
    }

    pub fn with_buffer(buffer: usize) -> Self {
        let (tx, _rx) = channels::join_channel_with_buffer(buffer);
        Self { tx }
    }

    /// Publish a frame to every current subscriber.
    ///
    /// Returns the number of subscribers the frame was delivered to; zero
    /// when nobody is listening.
    pub fn publish(&self, frame: ParticipantJoined) -> usize {
        match self.tx.send(frame) {
            Ok(delivered) => delivered,
            Err(_) => 0,
        }
    }

    /// Subscribe to the frames of a single event.
    pub fn subscribe(&self, event_id: Uuid) -> JoinFeed {
        JoinFeed {
            event_id,
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for JoinNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    /// The subscriber fell behind and `skipped` frames were dropped.
    /// The feed stays usable; callers re-snapshot and keep receiving.
    #[error("join feed lagged, {0} frames skipped")]
    Lagged(u64),
    /// Every publisher handle is gone.
    #[error("join feed closed")]
    Closed,
}

/// A subscription filtered to one event's frames.
pub struct JoinFeed {
    event_id: Uuid,
    rx: JoinReceiver,
}

impl JoinFeed {
    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    /// Next frame for this event. Frames of other events are skipped.
    pub async fn recv(&mut self) -> Result<ParticipantJoined, FeedError> {
        use tokio::sync::broadcast::error::RecvError;
        loop {
            match self.rx.recv().await {
                Ok(frame) if frame.event_id == self.event_id => return Ok(frame),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => return Err(FeedError::Lagged(skipped)),
                Err(RecvError::Closed) => return Err(FeedError::Closed),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn frame(event_id: Uuid, name: &str) -> ParticipantJoined {
        ParticipantJoined {
            event_id,
            participant_id: crate::ids::generate_entity_id(crate::ids::PARTICIPANT_ID_PREFIX),
            name: name.to_owned(),
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers_delivers_to_nobody() {
        let notifier = JoinNotifier::new();
        assert_eq!(notifier.publish(frame(Uuid::new_v4(), "Alice")), 0);
    }

    #[tokio::test]
    async fn feed_filters_frames_to_its_event() {
        let notifier = JoinNotifier::new();
        let watched = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut feed = notifier.subscribe(watched);

        assert_eq!(notifier.publish(frame(other, "Noise")), 1);
        let published = frame(watched, "Alice");
        assert_eq!(notifier.publish(published.clone()), 1);

        let received = feed.recv().await.unwrap();
        assert_eq!(received, published);
    }

    #[tokio::test]
    async fn feed_reports_closed_when_publishers_are_gone() {
        let notifier = JoinNotifier::new();
        let mut feed = notifier.subscribe(Uuid::new_v4());
        drop(notifier);
        assert_eq!(feed.recv().await, Err(FeedError::Closed));
    }
}
