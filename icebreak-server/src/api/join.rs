//! Admission handlers.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use icebreak_sdk::objects::{JoinAsGuestRequest, JoinAsUserRequest};
use uuid::Uuid;

use super::{ApiError, participant_to_response};
use crate::state::AppState;

/// `POST /events/{event_id}/join` — join an event as a registered user.
///
/// Admits the user under the capacity and uniqueness rules and broadcasts
/// a `participant_joined` frame to the event's live feed.
pub(super) async fn join_as_user(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(body): Json<JoinAsUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let participant = state
        .admission
        .admit_user(event_id, body.user_id, &body.name)
        .await?;
    Ok(Json(participant_to_response(&participant)))
}

/// `POST /events/{event_id}/join-guest` — join an event as a guest.
///
/// Guests carry only a display name; the name must be free in this event.
pub(super) async fn join_as_guest(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(body): Json<JoinAsGuestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let participant = state.admission.admit_guest(event_id, &body.name).await?;
    Ok(Json(participant_to_response(&participant)))
}
