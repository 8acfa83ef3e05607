//! The admission protocol.
//!
//! Decides whether a participant may join an event and performs the join.
//! Pre-checks give precise early failures; the storage constraints and the
//! atomic conditional registration are what actually close the races, so a
//! request that slips past a pre-check still cannot violate the capacity
//! or uniqueness invariants.

use crate::entities::events::EventRecord;
use crate::entities::participants::{NewParticipant, Participant};
use crate::ids::{self, JoinCode};
use crate::live::{JoinNotifier, ParticipantJoined};
use crate::stores::{
    EventStore, ParticipantStore, RegisterOutcome, StoreError, UniqueKey, UserStore,
};
use uuid::Uuid;

/// Retry budget for drawing an unused join code.
const JOIN_CODE_ATTEMPTS: usize = 16;

/// Longest accepted display name, in characters.
const MAX_NAME_LEN: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    #[error("event not found: {0}")]
    EventNotFound(Uuid),
    #[error("no event with join code {0}")]
    UnknownJoinCode(JoinCode),
    #[error("user not found: {0}")]
    UserNotFound(Uuid),
    #[error("event {event_id} is full ({max_participants} participants)")]
    EventFull {
        event_id: Uuid,
        max_participants: i32,
    },
    #[error("user already joined event {event_id}")]
    AlreadyJoined { event_id: Uuid },
    #[error("display name {name:?} is already taken in event {event_id}")]
    NameTaken { event_id: Uuid, name: String },
    #[error("invalid display name: {0}")]
    InvalidName(&'static str),
    #[error("could not allocate an unused join code after {attempts} attempts")]
    JoinCodesExhausted { attempts: usize },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Admits participants into events and owns the join-code contract.
#[derive(Clone)]
pub struct AdmissionService<E, U, P> {
    events: E,
    users: U,
    participants: P,
    notifier: JoinNotifier,
}

impl<E, U, P> AdmissionService<E, U, P>
where
    E: EventStore,
    U: UserStore,
    P: ParticipantStore,
{
    pub fn new(events: E, users: U, participants: P, notifier: JoinNotifier) -> Self {
        Self {
            events,
            users,
            participants,
            notifier,
        }
    }

    /// Admit a registered user.
    #[tracing::instrument(skip(self, name), fields(%event_id, %user_id))]
    pub async fn admit_user(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        name: &str,
    ) -> Result<Participant, AdmissionError> {
        let name = validate_display_name(name)?;
        let event = self.require_event(event_id).await?;
        if !self.users.exists(user_id).await? {
            return Err(AdmissionError::UserNotFound(user_id));
        }
        self.check_capacity(&event)?;
        if self
            .participants
            .find_by_user(event_id, user_id)
            .await?
            .is_some()
        {
            return Err(AdmissionError::AlreadyJoined { event_id });
        }
        self.check_name_free(event_id, &name).await?;
        self.finish(event, Some(user_id), name).await
    }

    /// Admit a guest (no backing user record).
    #[tracing::instrument(skip(self, name), fields(%event_id))]
    pub async fn admit_guest(
        &self,
        event_id: Uuid,
        name: &str,
    ) -> Result<Participant, AdmissionError> {
        let name = validate_display_name(name)?;
        let event = self.require_event(event_id).await?;
        self.check_capacity(&event)?;
        self.check_name_free(event_id, &name).await?;
        self.finish(event, None, name).await
    }

    /// Look up an event by its join code.
    pub async fn find_by_code(&self, code: &JoinCode) -> Result<EventRecord, AdmissionError> {
        self.events
            .find_by_join_code(code)
            .await?
            .ok_or_else(|| AdmissionError::UnknownJoinCode(code.clone()))
    }

    /// Draw a join code that no live event uses yet.
    ///
    /// The generator gives no uniqueness guarantee, so each draw is checked
    /// against the store; the unique index on the event table is the final
    /// arbiter at creation time.
    pub async fn allocate_join_code(&self) -> Result<JoinCode, AdmissionError> {
        for _ in 0..JOIN_CODE_ATTEMPTS {
            let code = ids::generate_join_code();
            if !self.events.join_code_taken(&code).await? {
                return Ok(code);
            }
        }
        Err(AdmissionError::JoinCodesExhausted {
            attempts: JOIN_CODE_ATTEMPTS,
        })
    }

    async fn require_event(&self, event_id: Uuid) -> Result<EventRecord, AdmissionError> {
        self.events
            .find_by_id(event_id)
            .await?
            .ok_or(AdmissionError::EventNotFound(event_id))
    }

    fn check_capacity(&self, event: &EventRecord) -> Result<(), AdmissionError> {
        if event.participant_count >= event.max_participants {
            return Err(AdmissionError::EventFull {
                event_id: event.id,
                max_participants: event.max_participants,
            });
        }
        Ok(())
    }

    async fn check_name_free(&self, event_id: Uuid, name: &str) -> Result<(), AdmissionError> {
        if self
            .participants
            .find_by_name(event_id, name)
            .await?
            .is_some()
        {
            return Err(AdmissionError::NameTaken {
                event_id,
                name: name.to_owned(),
            });
        }
        Ok(())
    }

    /// Create the participant and register it against the event.
    ///
    /// The two writes are separate store operations; when the registration
    /// reports the id already present or the event full, the admission is
    /// rejected and the just-created participant row is removed again.
    async fn finish(
        &self,
        event: EventRecord,
        user_id: Option<Uuid>,
        name: String,
    ) -> Result<Participant, AdmissionError> {
        let new = NewParticipant {
            id: ids::generate_entity_id(ids::PARTICIPANT_ID_PREFIX),
            event_id: event.id,
            user_id,
            name: name.clone(),
        };
        let participant = match self.participants.create(new).await {
            Ok(participant) => participant,
            Err(StoreError::UniqueViolation(UniqueKey::ParticipantUser)) => {
                return Err(AdmissionError::AlreadyJoined { event_id: event.id });
            }
            Err(StoreError::UniqueViolation(UniqueKey::ParticipantName)) => {
                return Err(AdmissionError::NameTaken {
                    event_id: event.id,
                    name,
                });
            }
            Err(e) => return Err(e.into()),
        };

        match self
            .events
            .register_participant(event.id, &participant.id)
            .await
        {
            Ok(RegisterOutcome::Added) => {}
            Ok(RegisterOutcome::AlreadyPresent) => {
                self.discard(&participant).await;
                return Err(AdmissionError::AlreadyJoined { event_id: event.id });
            }
            Ok(RegisterOutcome::Full) => {
                self.discard(&participant).await;
                return Err(AdmissionError::EventFull {
                    event_id: event.id,
                    max_participants: event.max_participants,
                });
            }
            Ok(RegisterOutcome::EventMissing) => {
                self.discard(&participant).await;
                return Err(AdmissionError::EventNotFound(event.id));
            }
            Err(e) => {
                self.discard(&participant).await;
                return Err(e.into());
            }
        }

        if let Some(user_id) = participant.user_id {
            // Best-effort history denormalization; the admission stands
            // even if this write fails.
            if let Err(e) = self.users.append_event_history(user_id, event.id).await {
                tracing::warn!(
                    error = %e,
                    %user_id,
                    event_id = %event.id,
                    "failed to append event to user history"
                );
            }
        }

        let delivered = self.notifier.publish(ParticipantJoined {
            event_id: event.id,
            participant_id: participant.id.clone(),
            name: participant.name.clone(),
        });
        tracing::debug!(
            event_id = %event.id,
            participant_id = %participant.id,
            delivered,
            "published participant-joined frame"
        );

        Ok(participant)
    }

    async fn discard(&self, participant: &Participant) {
        if let Err(e) = self.participants.delete(&participant.id).await {
            tracing::warn!(
                error = %e,
                participant_id = %participant.id,
                "failed to remove participant after lost registration race"
            );
        }
    }
}

fn validate_display_name(name: &str) -> Result<String, AdmissionError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AdmissionError::InvalidName("display name must not be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(AdmissionError::InvalidName("display name too long"));
    }
    Ok(trimmed.to_owned())
}
