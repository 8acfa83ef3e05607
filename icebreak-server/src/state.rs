//! Application state shared across all request handlers.

use icebreak_core::entities::connections::{ConnectionKind, PgConnectionStore};
use icebreak_core::entities::events::PgEventStore;
use icebreak_core::entities::participants::PgParticipantStore;
use icebreak_core::entities::users::PgUserStore;
use icebreak_core::live::JoinNotifier;
use icebreak_core::services::admission::AdmissionService;
use icebreak_core::services::connections::ConnectionService;
use sqlx::PgPool;

pub type PgAdmissionService = AdmissionService<PgEventStore, PgUserStore, PgParticipantStore>;
pub type PgConnectionService =
    ConnectionService<PgConnectionStore, PgEventStore, PgUserStore, PgParticipantStore>;

/// Application state that is shared across all request handlers.
///
/// Cloneable and cheap to pass around: every store wraps the shared pool.
#[derive(Clone)]
pub struct AppState {
    /// Live join-feed publisher, shared with the admission service.
    pub notifier: JoinNotifier,
    pub admission: PgAdmissionService,
    pub user_connections: PgConnectionService,
    pub participant_connections: PgConnectionService,
    /// Direct store handles for the WebSocket snapshot path.
    pub events: PgEventStore,
    pub participants: PgParticipantStore,
}

impl AppState {
    pub fn new(db: PgPool, notifier: JoinNotifier) -> Self {
        let events = PgEventStore::new(db.clone());
        let users = PgUserStore::new(db.clone());
        let participants = PgParticipantStore::new(db.clone());

        let admission = AdmissionService::new(
            events.clone(),
            users.clone(),
            participants.clone(),
            notifier.clone(),
        );
        let user_connections = ConnectionService::new(
            ConnectionKind::User,
            PgConnectionStore::new(db.clone(), ConnectionKind::User),
            events.clone(),
            users.clone(),
            participants.clone(),
        );
        let participant_connections = ConnectionService::new(
            ConnectionKind::Participant,
            PgConnectionStore::new(db, ConnectionKind::Participant),
            events.clone(),
            users,
            participants.clone(),
        );

        Self {
            notifier,
            admission,
            user_connections,
            participant_connections,
            events,
            participants,
        }
    }
}
