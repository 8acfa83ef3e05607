//! In-memory stores for exercising the services without a database.
//!
//! These implement the same trait contracts as the Postgres stores,
//! including the unique-constraint surfacing and the atomic conditional
//! registration, with a single mutex standing in for the storage engine's
//! serialization.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use icebreak_core::entities::EventState;
use icebreak_core::entities::connections::{Connection, ConnectionKind, NewConnection};
use icebreak_core::entities::events::EventRecord;
use icebreak_core::entities::participants::{NewParticipant, Participant};
use icebreak_core::entities::users::UserRecord;
use icebreak_core::ids::JoinCode;
use icebreak_core::live::JoinNotifier;
use icebreak_core::services::admission::AdmissionService;
use icebreak_core::services::connections::ConnectionService;
use icebreak_core::stores::{
    ConnectionStore, EventStore, ParticipantStore, RegisterOutcome, StoreError, UniqueKey,
    UserStore,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

fn now() -> time::PrimitiveDateTime {
    let t = time::OffsetDateTime::now_utc();
    time::PrimitiveDateTime::new(t.date(), t.time())
}

#[derive(Default)]
struct Inner {
    events: HashMap<Uuid, EventRecord>,
    memberships: HashMap<Uuid, Vec<String>>,
    users: HashMap<Uuid, UserRecord>,
    histories: HashMap<Uuid, Vec<Uuid>>,
    participants: Vec<Participant>,
    user_connections: Vec<Connection>,
    participant_connections: Vec<Connection>,
    all_codes_taken: bool,
}

#[derive(Clone, Default)]
pub struct MemBackend {
    inner: Arc<Mutex<Inner>>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    pub fn add_event(&self, name: &str, join_code: &str, max_participants: i32) -> EventRecord {
        let start = now();
        let record = EventRecord {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            description: None,
            join_code: join_code.to_owned(),
            start_at: start,
            end_at: start + time::Duration::hours(2),
            max_participants,
            participant_count: 0,
            state: EventState::InProgress,
            created_by: Uuid::new_v4(),
            created_at: start,
        };
        self.lock().events.insert(record.id, record.clone());
        record
    }

    pub fn add_user(&self, email: &str, name: &str) -> UserRecord {
        let user = UserRecord {
            id: Uuid::new_v4(),
            email: email.to_owned(),
            name: name.to_owned(),
        };
        self.lock().users.insert(user.id, user.clone());
        user
    }

    /// Make every join code look taken, to exercise allocation retries.
    pub fn set_all_codes_taken(&self, taken: bool) {
        self.lock().all_codes_taken = taken;
    }

    pub fn membership(&self, event_id: Uuid) -> Vec<String> {
        self.lock()
            .memberships
            .get(&event_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn participant_rows(&self, event_id: Uuid) -> usize {
        self.lock()
            .participants
            .iter()
            .filter(|p| p.event_id == event_id)
            .count()
    }

    pub fn history(&self, user_id: Uuid) -> Vec<Uuid> {
        self.lock()
            .histories
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn connection_store(&self, kind: ConnectionKind) -> MemConnectionStore {
        MemConnectionStore {
            backend: self.clone(),
            kind,
        }
    }
}

#[async_trait]
impl EventStore for MemBackend {
    async fn find_by_id(&self, event_id: Uuid) -> Result<Option<EventRecord>, StoreError> {
        Ok(self.lock().events.get(&event_id).cloned())
    }

    async fn find_by_join_code(&self, code: &JoinCode) -> Result<Option<EventRecord>, StoreError> {
        Ok(self
            .lock()
            .events
            .values()
            .find(|e| e.join_code == code.as_str())
            .cloned())
    }

    async fn join_code_taken(&self, code: &JoinCode) -> Result<bool, StoreError> {
        let inner = self.lock();
        Ok(inner.all_codes_taken
            || inner.events.values().any(|e| e.join_code == code.as_str()))
    }

    async fn register_participant(
        &self,
        event_id: Uuid,
        participant_id: &str,
    ) -> Result<RegisterOutcome, StoreError> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let Some(event) = inner.events.get_mut(&event_id) else {
            return Ok(RegisterOutcome::EventMissing);
        };
        let members = inner.memberships.entry(event_id).or_default();
        if members.iter().any(|m| m == participant_id) {
            return Ok(RegisterOutcome::AlreadyPresent);
        }
        if event.participant_count >= event.max_participants {
            return Ok(RegisterOutcome::Full);
        }
        members.push(participant_id.to_owned());
        event.participant_count += 1;
        Ok(RegisterOutcome::Added)
    }

    async fn list_participant_ids(&self, event_id: Uuid) -> Result<Vec<String>, StoreError> {
        Ok(self
            .lock()
            .memberships
            .get(&event_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl UserStore for MemBackend {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.lock().users.get(&user_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn exists(&self, user_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.lock().users.contains_key(&user_id))
    }

    async fn append_event_history(&self, user_id: Uuid, event_id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let history = inner.histories.entry(user_id).or_default();
        if !history.contains(&event_id) {
            history.push(event_id);
        }
        Ok(())
    }
}

#[async_trait]
impl ParticipantStore for MemBackend {
    async fn create(&self, new: NewParticipant) -> Result<Participant, StoreError> {
        let mut inner = self.lock();
        if let Some(user_id) = new.user_id {
            if inner
                .participants
                .iter()
                .any(|p| p.event_id == new.event_id && p.user_id == Some(user_id))
            {
                return Err(StoreError::UniqueViolation(UniqueKey::ParticipantUser));
            }
        }
        if inner
            .participants
            .iter()
            .any(|p| p.event_id == new.event_id && p.name == new.name)
        {
            return Err(StoreError::UniqueViolation(UniqueKey::ParticipantName));
        }
        let participant = Participant {
            id: new.id,
            event_id: new.event_id,
            user_id: new.user_id,
            name: new.name,
            joined_at: now(),
        };
        inner.participants.push(participant.clone());
        Ok(participant)
    }

    async fn find_by_id(&self, participant_id: &str) -> Result<Option<Participant>, StoreError> {
        Ok(self
            .lock()
            .participants
            .iter()
            .find(|p| p.id == participant_id)
            .cloned())
    }

    async fn find_by_user(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participant>, StoreError> {
        Ok(self
            .lock()
            .participants
            .iter()
            .find(|p| p.event_id == event_id && p.user_id == Some(user_id))
            .cloned())
    }

    async fn find_by_name(
        &self,
        event_id: Uuid,
        name: &str,
    ) -> Result<Option<Participant>, StoreError> {
        Ok(self
            .lock()
            .participants
            .iter()
            .find(|p| p.event_id == event_id && p.name == name)
            .cloned())
    }

    async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<Participant>, StoreError> {
        Ok(self
            .lock()
            .participants
            .iter()
            .filter(|p| p.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, participant_id: &str) -> Result<(), StoreError> {
        self.lock().participants.retain(|p| p.id != participant_id);
        Ok(())
    }
}

#[derive(Clone)]
pub struct MemConnectionStore {
    backend: MemBackend,
    kind: ConnectionKind,
}

impl MemConnectionStore {
    fn rows<'a>(&self, inner: &'a mut Inner) -> &'a mut Vec<Connection> {
        match self.kind {
            ConnectionKind::User => &mut inner.user_connections,
            ConnectionKind::Participant => &mut inner.participant_connections,
        }
    }
}

#[async_trait]
impl ConnectionStore for MemConnectionStore {
    async fn insert(&self, new: NewConnection) -> Result<Connection, StoreError> {
        let mut guard = self.backend.lock();
        let rows = self.rows(&mut guard);
        if rows.iter().any(|c| {
            c.event_id == new.event_id
                && c.primary_id == new.primary_id
                && c.secondary_id == new.secondary_id
        }) {
            return Err(StoreError::UniqueViolation(UniqueKey::ConnectionPair));
        }
        let connection = Connection {
            id: new.id,
            event_id: new.event_id,
            primary_id: new.primary_id,
            secondary_id: new.secondary_id,
            description: new.description,
            created_at: now(),
        };
        rows.push(connection.clone());
        Ok(connection)
    }

    async fn find_by_pair(
        &self,
        event_id: Uuid,
        primary_id: &str,
        secondary_id: &str,
    ) -> Result<Option<Connection>, StoreError> {
        let mut guard = self.backend.lock();
        Ok(self
            .rows(&mut guard)
            .iter()
            .find(|c| {
                c.event_id == event_id
                    && c.primary_id == primary_id
                    && c.secondary_id == secondary_id
            })
            .cloned())
    }

    async fn delete(
        &self,
        event_id: Uuid,
        connection_id: &str,
    ) -> Result<Option<Connection>, StoreError> {
        let mut guard = self.backend.lock();
        let rows = self.rows(&mut guard);
        let found = rows
            .iter()
            .position(|c| c.event_id == event_id && c.id == connection_id);
        Ok(found.map(|idx| rows.remove(idx)))
    }

    async fn list_by_endpoint(
        &self,
        event_id: Uuid,
        endpoint_id: &str,
    ) -> Result<Vec<Connection>, StoreError> {
        let mut guard = self.backend.lock();
        Ok(self
            .rows(&mut guard)
            .iter()
            .filter(|c| {
                c.event_id == event_id
                    && (c.primary_id == endpoint_id || c.secondary_id == endpoint_id)
            })
            .cloned()
            .collect())
    }
}

pub type MemAdmissionService = AdmissionService<MemBackend, MemBackend, MemBackend>;
pub type MemConnectionService =
    ConnectionService<MemConnectionStore, MemBackend, MemBackend, MemBackend>;

pub fn admission(backend: &MemBackend, notifier: JoinNotifier) -> MemAdmissionService {
    AdmissionService::new(
        backend.clone(),
        backend.clone(),
        backend.clone(),
        notifier,
    )
}

pub fn connections(backend: &MemBackend, kind: ConnectionKind) -> MemConnectionService {
    ConnectionService::new(
        kind,
        backend.connection_store(kind),
        backend.clone(),
        backend.clone(),
        backend.clone(),
    )
}
