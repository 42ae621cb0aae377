use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use axum_valid::Valid;

use crate::{
    dto::availability::{AvailabilityResponse, ReplaceAvailabilityRequest},
    error::AppError,
    services::availability_service,
    state::{SharedState, league::ParticipantId},
};

/// Availability read and replace endpoints.
pub fn router() -> Router<SharedState> {
    Router::new().route(
        "/participants/{id}/availability",
        get(get_availability).put(replace_availability),
    )
}

/// Stored availability windows of a participant, sorted by date.
#[utoipa::path(
    get,
    path = "/participants/{id}/availability",
    tag = "availability",
    params(("id" = String, Path, description = "Participant id")),
    responses(
        (status = 200, description = "Current windows", body = AvailabilityResponse),
        (status = 404, description = "Unknown participant"),
    )
)]
pub async fn get_availability(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let participant_id = ParticipantId::from(id);
    Ok(Json(
        availability_service::get_windows(&state, &participant_id).await?,
    ))
}

/// Replace every window of a participant. Other participants are untouched.
#[utoipa::path(
    put,
    path = "/participants/{id}/availability",
    tag = "availability",
    params(("id" = String, Path, description = "Participant id")),
    request_body = ReplaceAvailabilityRequest,
    responses(
        (status = 200, description = "Windows stored", body = AvailabilityResponse),
        (status = 400, description = "Invalid window, duplicate date or past date"),
        (status = 404, description = "Unknown participant"),
        (status = 503, description = "League store unavailable"),
    )
)]
pub async fn replace_availability(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Valid(Json(payload)): Valid<Json<ReplaceAvailabilityRequest>>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let participant_id = ParticipantId::from(id);
    Ok(Json(
        availability_service::replace_windows(&state, &participant_id, &payload).await?,
    ))
}
