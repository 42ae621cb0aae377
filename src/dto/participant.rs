use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::state::league::Participant;

/// Credentials submitted to `/login`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    /// Participant id; surrounding whitespace is ignored.
    #[validate(length(min = 1, max = 64))]
    pub participant_id: String,
    /// Credential compared exactly with the stored one.
    #[validate(length(min = 1))]
    pub credential: String,
}

/// Public view of a participant.
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ParticipantResponse {
    /// Participant id.
    pub id: String,
    /// Name shown to other players.
    pub display_name: String,
    /// Empty when the participant has no group.
    pub group_tag: String,
}

impl From<Participant> for ParticipantResponse {
    fn from(participant: Participant) -> Self {
        Self {
            id: participant.id.to_string(),
            display_name: participant.display_name,
            group_tag: participant.group_tag.to_string(),
        }
    }
}
