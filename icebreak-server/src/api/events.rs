//! Join-code lookup handler.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use icebreak_core::ids::JoinCode;
use std::str::FromStr;

use super::{ApiError, event_to_response};
use crate::state::AppState;

/// `GET /events/by-code/{join_code}` — resolve a join code to its event.
///
/// Malformed codes are rejected before any store access.
pub(super) async fn get_by_join_code(
    State(state): State<AppState>,
    Path(join_code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let code = JoinCode::from_str(&join_code)
        .map_err(|_| ApiError::BadRequest("join code must be exactly 8 decimal digits"))?;
    let event = state.admission.find_by_code(&code).await?;
    Ok(Json(event_to_response(&event)))
}
