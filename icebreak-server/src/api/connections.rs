//! Connection handlers.
//!
//! The same four operations exist for both connection variants; the thin
//! route wrappers only pick which service answers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use icebreak_sdk::objects::{
    ConnectionResponse, CreateConnectionByEmailRequest, CreateConnectionRequest,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiError, connection_to_response};
use crate::state::{AppState, PgConnectionService};

#[derive(Debug, Deserialize)]
pub(super) struct ConnectionQuery {
    endpoint: Option<String>,
    email: Option<String>,
}

async fn create(
    service: &PgConnectionService,
    event_id: Uuid,
    body: CreateConnectionRequest,
) -> Result<(StatusCode, Json<ConnectionResponse>), ApiError> {
    let connection = service
        .create(event_id, &body.primary_id, &body.secondary_id, body.description)
        .await?;
    Ok((StatusCode::CREATED, Json(connection_to_response(&connection))))
}

async fn create_by_email(
    service: &PgConnectionService,
    event_id: Uuid,
    body: CreateConnectionByEmailRequest,
) -> Result<(StatusCode, Json<ConnectionResponse>), ApiError> {
    let connection = service
        .create_by_email(
            event_id,
            &body.primary_email,
            &body.secondary_email,
            body.description,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(connection_to_response(&connection))))
}

async fn remove(
    service: &PgConnectionService,
    event_id: Uuid,
    connection_id: &str,
) -> Result<Json<ConnectionResponse>, ApiError> {
    let deleted = service.delete(event_id, connection_id).await?;
    Ok(Json(connection_to_response(&deleted)))
}

/// Query by endpoint id or by email; exactly one selector is accepted.
async fn list(
    service: &PgConnectionService,
    event_id: Uuid,
    query: ConnectionQuery,
) -> Result<Json<Vec<ConnectionResponse>>, ApiError> {
    let connections = match (query.endpoint, query.email) {
        (Some(endpoint), None) => service.list_by_endpoint(event_id, &endpoint).await?,
        (None, Some(email)) => service.list_by_email(event_id, &email).await?,
        _ => {
            return Err(ApiError::BadRequest(
                "exactly one of `endpoint` or `email` query parameters is required",
            ));
        }
    };
    Ok(Json(
        connections
            .iter()
            .map(connection_to_response)
            .collect::<Vec<_>>(),
    ))
}

// ---------------------------------------------------------------------------
// User connections
// ---------------------------------------------------------------------------

/// `POST /events/{event_id}/user-connections`
pub(super) async fn create_user_connection(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(body): Json<CreateConnectionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    create(&state.user_connections, event_id, body).await
}

/// `POST /events/{event_id}/user-connections/by-email`
pub(super) async fn create_user_connection_by_email(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(body): Json<CreateConnectionByEmailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    create_by_email(&state.user_connections, event_id, body).await
}

/// `GET /events/{event_id}/user-connections?endpoint=…|email=…`
pub(super) async fn list_user_connections(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Query(query): Query<ConnectionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    list(&state.user_connections, event_id, query).await
}

/// `DELETE /events/{event_id}/user-connections/{connection_id}`
pub(super) async fn delete_user_connection(
    State(state): State<AppState>,
    Path((event_id, connection_id)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, ApiError> {
    remove(&state.user_connections, event_id, &connection_id).await
}

// ---------------------------------------------------------------------------
// Participant connections
// ---------------------------------------------------------------------------

/// `POST /events/{event_id}/participant-connections`
pub(super) async fn create_participant_connection(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(body): Json<CreateConnectionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    create(&state.participant_connections, event_id, body).await
}

/// `POST /events/{event_id}/participant-connections/by-email`
pub(super) async fn create_participant_connection_by_email(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(body): Json<CreateConnectionByEmailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    create_by_email(&state.participant_connections, event_id, body).await
}

/// `GET /events/{event_id}/participant-connections?endpoint=…|email=…`
pub(super) async fn list_participant_connections(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Query(query): Query<ConnectionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    list(&state.participant_connections, event_id, query).await
}

/// `DELETE /events/{event_id}/participant-connections/{connection_id}`
pub(super) async fn delete_participant_connection(
    State(state): State<AppState>,
    Path((event_id, connection_id)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, ApiError> {
    remove(&state.participant_connections, event_id, &connection_id).await
}
