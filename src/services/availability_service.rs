use crate::{
    dto::availability::{AvailabilityResponse, ReplaceAvailabilityRequest, WindowDto},
    error::ServiceError,
    state::{SharedState, league::ParticipantId},
};

/// Stored availability of a known participant.
pub async fn get_windows(
    state: &SharedState,
    participant_id: &ParticipantId,
) -> Result<AvailabilityResponse, ServiceError> {
    let participants = state.participant_repository().await?;
    if participants.find_row(participant_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!("participant `{participant_id}`")));
    }

    let windows = state
        .availability_repository()
        .await?
        .get_windows(participant_id)
        .await?;
    Ok(AvailabilityResponse {
        participant_id: participant_id.to_string(),
        windows: windows.iter().map(WindowDto::from).collect(),
    })
}

/// Replace a participant's availability with a validated submission.
///
/// Rows are tagged with the participant's own group.
pub async fn replace_windows(
    state: &SharedState,
    participant_id: &ParticipantId,
    request: &ReplaceAvailabilityRequest,
) -> Result<AvailabilityResponse, ServiceError> {
    let participant = state
        .participant_repository()
        .await?
        .find(participant_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("participant `{participant_id}`")))?;

    let windows = request
        .windows
        .iter()
        .map(|window| window.to_window(participant_id))
        .collect::<Result<Vec<_>, _>>()
        .map_err(ServiceError::InvalidInput)?;

    let stored = state
        .availability_repository()
        .await?
        .replace_windows(participant_id, &participant.group_tag, windows)
        .await?;
    Ok(AvailabilityResponse {
        participant_id: participant_id.to_string(),
        windows: stored.iter().map(WindowDto::from).collect(),
    })
}
