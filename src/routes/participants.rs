use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::participant::{LoginRequest, ParticipantResponse},
    error::AppError,
    services::participant_service,
    state::{SharedState, league::ParticipantId},
};

/// Login and participant lookup endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/login", post(login))
        .route("/participants/{id}", get(participant_info))
}

/// Check a participant's credential.
#[utoipa::path(
    post,
    path = "/login",
    tag = "participants",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credential accepted", body = ParticipantResponse),
        (status = 400, description = "Malformed request"),
        (status = 401, description = "Unknown participant or wrong credential"),
        (status = 503, description = "League store unavailable"),
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<LoginRequest>>,
) -> Result<Json<ParticipantResponse>, AppError> {
    Ok(Json(participant_service::authenticate(&state, &payload).await?))
}

/// Display name and group of a participant.
#[utoipa::path(
    get,
    path = "/participants/{id}",
    tag = "participants",
    params(("id" = String, Path, description = "Participant id")),
    responses(
        (status = 200, description = "Participant found", body = ParticipantResponse),
        (status = 404, description = "Unknown participant"),
    )
)]
pub async fn participant_info(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ParticipantResponse>, AppError> {
    let participant_id = ParticipantId::from(id);
    Ok(Json(
        participant_service::participant_info(&state, &participant_id).await?,
    ))
}
