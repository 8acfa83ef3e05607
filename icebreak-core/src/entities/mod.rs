pub mod connections;
pub mod events;
pub mod participants;
pub mod users;

/// Lifecycle state of an event.
///
/// Advanced outside this core; the admission path only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "event_state")]
pub enum EventState {
    Upcoming,
    InProgress,
    Completed,
}

impl EventState {
    pub fn as_str(self) -> &'static str {
        match self {
            EventState::Upcoming => "upcoming",
            EventState::InProgress => "in_progress",
            EventState::Completed => "completed",
        }
    }
}
