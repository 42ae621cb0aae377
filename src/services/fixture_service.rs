//! Fixture reads, match candidates and player-driven lifecycle actions.

use std::collections::BTreeSet;

use tracing::info;

use crate::{
    dto::fixture::{
        AdvanceResponse, FixtureCandidatesResponse, FixtureResponse, ParticipantFixturesResponse,
        ScheduleRequest,
    },
    error::ServiceError,
    services::matching::find_candidates,
    state::{
        SharedState,
        league::{Fixture, FixtureId, GroupTag, ParticipantId},
    },
};

/// Advance past-due fixtures of `group_tag` to PLAYED.
pub async fn advance_past_due(
    state: &SharedState,
    group_tag: &GroupTag,
) -> Result<AdvanceResponse, ServiceError> {
    let advanced = state
        .fixture_repository()
        .await?
        .advance_past_due(group_tag)
        .await?;
    if advanced > 0 {
        info!(group_tag = %group_tag, advanced, "advanced past-due fixtures");
    }
    Ok(AdvanceResponse {
        group_tag: group_tag.to_string(),
        advanced,
    })
}

/// The participant's fixtures by state, after advancing the groups they play in.
pub async fn fixtures_for_participant(
    state: &SharedState,
    participant_id: &ParticipantId,
) -> Result<ParticipantFixturesResponse, ServiceError> {
    let fixtures = state.fixture_repository().await?;

    let groups: BTreeSet<GroupTag> = fixtures
        .all_fixtures(false)
        .await?
        .iter()
        .filter(|fixture| fixture.includes(participant_id))
        .map(|fixture| fixture.group_tag.clone())
        .collect();
    for group_tag in &groups {
        fixtures.advance_past_due(group_tag).await?;
    }

    let buckets = fixtures.get_fixtures_for_participant(participant_id).await?;
    let names = state.participant_repository().await?.display_names().await?;
    Ok(ParticipantFixturesResponse::new(&buckets, &names))
}

/// Candidate dates for every matchable fixture of a group.
pub async fn candidates_for_group(
    state: &SharedState,
    group_tag: &GroupTag,
) -> Result<Vec<FixtureCandidatesResponse>, ServiceError> {
    let fixtures = state
        .fixture_repository()
        .await?
        .fixtures_for_group(group_tag)
        .await?;
    candidates_for(state, &fixtures).await
}

/// Candidate dates for the participant's own pending fixtures.
pub async fn candidates_for_participant(
    state: &SharedState,
    participant_id: &ParticipantId,
) -> Result<Vec<FixtureCandidatesResponse>, ServiceError> {
    let pending = state
        .fixture_repository()
        .await?
        .get_fixtures_for_participant(participant_id)
        .await?
        .pending;
    candidates_for(state, &pending).await
}

async fn candidates_for(
    state: &SharedState,
    fixtures: &[Fixture],
) -> Result<Vec<FixtureCandidatesResponse>, ServiceError> {
    if fixtures.is_empty() {
        return Ok(Vec::new());
    }

    let index = state
        .availability_repository()
        .await?
        .availability_index()
        .await?;
    let found = find_candidates(
        fixtures,
        &index,
        state.clock().today(),
        state.config().min_overlap_minutes,
    );
    if found.is_empty() {
        return Ok(Vec::new());
    }

    let names = state.participant_repository().await?.display_names().await?;
    Ok(found
        .iter()
        .map(|entry| FixtureCandidatesResponse::new(entry, &names))
        .collect())
}

/// Lifecycle actions exposed to players.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureAction {
    /// Agree on a date and time.
    Confirm,
    /// Move an agreed booking.
    Edit,
    /// Drop an agreed booking.
    Cancel,
    /// Close a pending fixture by hand.
    Close,
}

/// Apply a lifecycle action, reporting an unknown fixture as not found.
pub async fn apply_action(
    state: &SharedState,
    fixture_id: &FixtureId,
    action: FixtureAction,
    schedule: Option<&ScheduleRequest>,
) -> Result<FixtureResponse, ServiceError> {
    let schedule = || {
        schedule
            .ok_or_else(|| ServiceError::InvalidInput("date and time are required".into()))?
            .to_schedule()
            .map_err(ServiceError::InvalidInput)
    };

    let fixtures = state.fixture_repository().await?;
    let updated = match action {
        FixtureAction::Confirm => fixtures.confirm(fixture_id, schedule()?).await?,
        FixtureAction::Edit => fixtures.edit(fixture_id, schedule()?).await?,
        FixtureAction::Cancel => fixtures.cancel(fixture_id).await?,
        FixtureAction::Close => fixtures.close(fixture_id).await?,
    };
    let fixture =
        updated.ok_or_else(|| ServiceError::NotFound(format!("fixture `{fixture_id}`")))?;

    let names = state.participant_repository().await?.display_names().await?;
    Ok(FixtureResponse::new(&fixture, &names))
}
