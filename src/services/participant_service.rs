//! Participant lookups and login.

use tracing::{info, warn};

use crate::{
    dto::participant::{LoginRequest, ParticipantResponse},
    error::ServiceError,
    state::{SharedState, league::ParticipantId},
};

/// Display name and group of a participant.
pub async fn participant_info(
    state: &SharedState,
    participant_id: &ParticipantId,
) -> Result<ParticipantResponse, ServiceError> {
    let participants = state.participant_repository().await?;
    participants
        .find(participant_id)
        .await?
        .map(ParticipantResponse::from)
        .ok_or_else(|| ServiceError::NotFound(format!("participant `{participant_id}`")))
}

/// Check the credential stored for the participant and return them on success.
///
/// Unknown ids and wrong credentials are indistinguishable to the caller.
pub async fn authenticate(
    state: &SharedState,
    request: &LoginRequest,
) -> Result<ParticipantResponse, ServiceError> {
    let participant_id = ParticipantId::from(request.participant_id.trim());
    let participants = state.participant_repository().await?;

    let accepted = participants
        .find_row(&participant_id)
        .await?
        .and_then(|row| row.credential)
        .is_some_and(|stored| stored == request.credential);
    if !accepted {
        warn!(participant_id = %participant_id, "rejected login");
        return Err(ServiceError::Unauthorized("invalid participant or credential".into()));
    }

    let participant = participants
        .find(&participant_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("participant `{participant_id}`")))?;
    info!(participant_id = %participant_id, "participant logged in");
    Ok(participant.into())
}
