//! HTTP API handlers.
//!
//! # Endpoints
//!
//! - `GET    /events/by-code/{join_code}`                        – look up an event by join code
//! - `POST   /events/{event_id}/join`                            – join as a registered user
//! - `POST   /events/{event_id}/join-guest`                      – join as a guest
//! - `GET    /events/{event_id}/live`                            – WebSocket live join feed
//! - `POST   /events/{event_id}/user-connections`                – create a user connection
//! - `POST   /events/{event_id}/user-connections/by-email`       – create by emails
//! - `GET    /events/{event_id}/user-connections?endpoint=|email=` – query connections
//! - `DELETE /events/{event_id}/user-connections/{id}`           – delete a connection
//! - the same four routes under `/participant-connections`

use axum::{
    Json, Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use icebreak_core::entities::EventState as CoreEventState;
use icebreak_core::entities::connections::Connection;
use icebreak_core::entities::events::EventRecord;
use icebreak_core::entities::participants::Participant;
use icebreak_core::services::admission::AdmissionError;
use icebreak_core::services::connections::ConnectionError;
use icebreak_core::services::identity::IdentityError;
use icebreak_sdk::objects::{ConnectionResponse, EventResponse, EventState, ParticipantResponse};

use crate::state::AppState;

mod connections;
mod events;
mod join;
mod live;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events/by-code/{join_code}", get(events::get_by_join_code))
        .route("/events/{event_id}/join", post(join::join_as_user))
        .route("/events/{event_id}/join-guest", post(join::join_as_guest))
        .route("/events/{event_id}/live", get(live::join_feed))
        .route(
            "/events/{event_id}/user-connections",
            post(connections::create_user_connection).get(connections::list_user_connections),
        )
        .route(
            "/events/{event_id}/user-connections/by-email",
            post(connections::create_user_connection_by_email),
        )
        .route(
            "/events/{event_id}/user-connections/{connection_id}",
            delete(connections::delete_user_connection),
        )
        .route(
            "/events/{event_id}/participant-connections",
            post(connections::create_participant_connection)
                .get(connections::list_participant_connections),
        )
        .route(
            "/events/{event_id}/participant-connections/by-email",
            post(connections::create_participant_connection_by_email),
        )
        .route(
            "/events/{event_id}/participant-connections/{connection_id}",
            delete(connections::delete_participant_connection),
        )
}

// ---------------------------------------------------------------------------
// Shared error type
// ---------------------------------------------------------------------------

/// Errors that can occur in API handlers.
#[derive(Debug)]
pub(crate) enum ApiError {
    Admission(AdmissionError),
    Connection(ConnectionError),
    BadRequest(&'static str),
}

impl From<AdmissionError> for ApiError {
    fn from(err: AdmissionError) -> Self {
        ApiError::Admission(err)
    }
}

impl From<ConnectionError> for ApiError {
    fn from(err: ConnectionError) -> Self {
        ApiError::Connection(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::Admission(err) => admission_response(err),
            ApiError::Connection(err) => connection_response(err),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
        }
    }
}

fn admission_response(err: AdmissionError) -> axum::response::Response {
    match err {
        AdmissionError::Store(e) => {
            tracing::error!(error = %e, "admission store error");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
        }
        err @ AdmissionError::JoinCodesExhausted { .. } => {
            tracing::error!(error = %err, "join code allocation failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
        }
        other => {
            let status = match &other {
                AdmissionError::EventNotFound(_)
                | AdmissionError::UnknownJoinCode(_)
                | AdmissionError::UserNotFound(_) => StatusCode::NOT_FOUND,
                // A full event is a client error, not a server fault.
                AdmissionError::EventFull { .. } | AdmissionError::InvalidName(_) => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::CONFLICT,
            };
            (status, other.to_string()).into_response()
        }
    }
}

fn connection_response(err: ConnectionError) -> axum::response::Response {
    match err {
        // The pre-existing record rides along for client convenience.
        ConnectionError::Duplicate { existing } => (
            StatusCode::CONFLICT,
            Json(connection_to_response(&existing)),
        )
            .into_response(),
        ConnectionError::Store(e) | ConnectionError::Identity(IdentityError::Store(e)) => {
            tracing::error!(error = %e, "connection store error");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
        }
        other => {
            let status = match &other {
                ConnectionError::InvalidEndpoint(_)
                | ConnectionError::InvalidConnectionId(_)
                | ConnectionError::InvalidEmail(_)
                | ConnectionError::SameEmail => StatusCode::BAD_REQUEST,
                _ => StatusCode::NOT_FOUND,
            };
            (status, other.to_string()).into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Convert a `Participant` (DB model) into a `ParticipantResponse` (API model).
pub(crate) fn participant_to_response(p: &Participant) -> ParticipantResponse {
    ParticipantResponse {
        id: p.id.clone(),
        event_id: p.event_id,
        user_id: p.user_id,
        name: p.name.clone(),
        joined_at: p.joined_at.assume_utc().unix_timestamp(),
    }
}

/// Convert a `Connection` (DB model) into a `ConnectionResponse` (API model).
pub(crate) fn connection_to_response(c: &Connection) -> ConnectionResponse {
    ConnectionResponse {
        id: c.id.clone(),
        event_id: c.event_id,
        primary_id: c.primary_id.clone(),
        secondary_id: c.secondary_id.clone(),
        description: c.description.clone(),
        created_at: c.created_at.assume_utc().unix_timestamp(),
    }
}

/// Convert an `EventRecord` (DB model) into an `EventResponse` (API model).
pub(crate) fn event_to_response(e: &EventRecord) -> EventResponse {
    EventResponse {
        id: e.id,
        name: e.name.clone(),
        description: e.description.clone(),
        join_code: e.join_code.clone(),
        start_at: e.start_at.assume_utc().unix_timestamp(),
        end_at: e.end_at.assume_utc().unix_timestamp(),
        max_participants: e.max_participants,
        participant_count: e.participant_count,
        state: match e.state {
            CoreEventState::Upcoming => EventState::Upcoming,
            CoreEventState::InProgress => EventState::InProgress,
            CoreEventState::Completed => EventState::Completed,
        },
        created_by: e.created_by,
    }
}
