use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::fixture::{
        AdvanceResponse, FixtureCandidatesResponse, FixtureResponse, ParticipantFixturesResponse,
        ScheduleRequest,
    },
    error::AppError,
    services::fixture_service::{self, FixtureAction},
    state::{
        SharedState,
        league::{FixtureId, GroupTag, ParticipantId},
    },
};

/// Fixture, candidate and scheduling endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/participants/{id}/fixtures", get(participant_fixtures))
        .route("/participants/{id}/candidates", get(participant_candidates))
        .route("/groups/{tag}/candidates", get(group_candidates))
        .route("/groups/{tag}/advance", post(advance_group))
        .route("/fixtures/{id}/confirm", post(confirm_fixture))
        .route("/fixtures/{id}/edit", post(edit_fixture))
        .route("/fixtures/{id}/cancel", post(cancel_fixture))
        .route("/fixtures/{id}/close", post(close_fixture))
}

/// A participant's fixtures grouped by state. Past-due fixtures are advanced first.
#[utoipa::path(
    get,
    path = "/participants/{id}/fixtures",
    tag = "fixtures",
    params(("id" = String, Path, description = "Participant id")),
    responses((status = 200, description = "Fixtures by state", body = ParticipantFixturesResponse))
)]
pub async fn participant_fixtures(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ParticipantFixturesResponse>, AppError> {
    let participant_id = ParticipantId::from(id);
    Ok(Json(
        fixture_service::fixtures_for_participant(&state, &participant_id).await?,
    ))
}

/// Candidate dates for the participant's pending fixtures.
#[utoipa::path(
    get,
    path = "/participants/{id}/candidates",
    tag = "fixtures",
    params(("id" = String, Path, description = "Participant id")),
    responses((status = 200, description = "Fixtures with at least one candidate", body = [FixtureCandidatesResponse]))
)]
pub async fn participant_candidates(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<FixtureCandidatesResponse>>, AppError> {
    let participant_id = ParticipantId::from(id);
    Ok(Json(
        fixture_service::candidates_for_participant(&state, &participant_id).await?,
    ))
}

/// Candidate dates for every pending fixture of a group.
#[utoipa::path(
    get,
    path = "/groups/{tag}/candidates",
    tag = "fixtures",
    params(("tag" = String, Path, description = "Group tag")),
    responses((status = 200, description = "Fixtures with at least one candidate", body = [FixtureCandidatesResponse]))
)]
pub async fn group_candidates(
    State(state): State<SharedState>,
    Path(tag): Path<String>,
) -> Result<Json<Vec<FixtureCandidatesResponse>>, AppError> {
    let group_tag = GroupTag::from(tag);
    Ok(Json(
        fixture_service::candidates_for_group(&state, &group_tag).await?,
    ))
}

/// Move the group's scheduled fixtures dated before today to `PLAYED`.
#[utoipa::path(
    post,
    path = "/groups/{tag}/advance",
    tag = "fixtures",
    params(("tag" = String, Path, description = "Group tag")),
    responses((status = 200, description = "Number of fixtures advanced", body = AdvanceResponse))
)]
pub async fn advance_group(
    State(state): State<SharedState>,
    Path(tag): Path<String>,
) -> Result<Json<AdvanceResponse>, AppError> {
    let group_tag = GroupTag::from(tag);
    Ok(Json(
        fixture_service::advance_past_due(&state, &group_tag).await?,
    ))
}

/// Schedule a pending fixture.
#[utoipa::path(
    post,
    path = "/fixtures/{id}/confirm",
    tag = "fixtures",
    params(("id" = String, Path, description = "Fixture id")),
    request_body = ScheduleRequest,
    responses(
        (status = 200, description = "Fixture scheduled", body = FixtureResponse),
        (status = 404, description = "Unknown fixture"),
        (status = 409, description = "Fixture is not pending"),
    )
)]
pub async fn confirm_fixture(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Valid(Json(payload)): Valid<Json<ScheduleRequest>>,
) -> Result<Json<FixtureResponse>, AppError> {
    run_action(&state, id, FixtureAction::Confirm, Some(&payload)).await
}

/// Move a scheduled fixture to another date or time.
#[utoipa::path(
    post,
    path = "/fixtures/{id}/edit",
    tag = "fixtures",
    params(("id" = String, Path, description = "Fixture id")),
    request_body = ScheduleRequest,
    responses(
        (status = 200, description = "Schedule updated", body = FixtureResponse),
        (status = 404, description = "Unknown fixture"),
        (status = 409, description = "Fixture is not scheduled"),
    )
)]
pub async fn edit_fixture(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Valid(Json(payload)): Valid<Json<ScheduleRequest>>,
) -> Result<Json<FixtureResponse>, AppError> {
    run_action(&state, id, FixtureAction::Edit, Some(&payload)).await
}

/// Drop the schedule of a fixture and put it back to `PENDING`.
#[utoipa::path(
    post,
    path = "/fixtures/{id}/cancel",
    tag = "fixtures",
    params(("id" = String, Path, description = "Fixture id")),
    responses(
        (status = 200, description = "Fixture pending again", body = FixtureResponse),
        (status = 404, description = "Unknown fixture"),
        (status = 409, description = "Fixture is not scheduled"),
    )
)]
pub async fn cancel_fixture(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<FixtureResponse>, AppError> {
    run_action(&state, id, FixtureAction::Cancel, None).await
}

/// Close a pending fixture manually.
#[utoipa::path(
    post,
    path = "/fixtures/{id}/close",
    tag = "fixtures",
    params(("id" = String, Path, description = "Fixture id")),
    responses(
        (status = 200, description = "Fixture closed", body = FixtureResponse),
        (status = 404, description = "Unknown fixture"),
        (status = 409, description = "Fixture is not pending"),
    )
)]
pub async fn close_fixture(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<FixtureResponse>, AppError> {
    run_action(&state, id, FixtureAction::Close, None).await
}

async fn run_action(
    state: &SharedState,
    id: String,
    action: FixtureAction,
    schedule: Option<&ScheduleRequest>,
) -> Result<Json<FixtureResponse>, AppError> {
    let fixture_id = FixtureId::from(id);
    Ok(Json(
        fixture_service::apply_action(state, &fixture_id, action, schedule).await?,
    ))
}
