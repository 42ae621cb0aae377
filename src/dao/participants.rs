use std::{collections::HashMap, sync::Arc};

use crate::{
    dao::{
        cache::{DatasetKey, LeagueCache},
        models::{AssignmentEntity, ParticipantEntity},
        resilient::ResilientStore,
        storage::StorageError,
    },
    state::league::{GroupTag, Participant, ParticipantId},
};

/// Read-only access to registered participants and their group assignments.
#[derive(Clone)]
pub struct ParticipantRepository {
    store: ResilientStore,
    cache: Arc<LeagueCache>,
}

impl ParticipantRepository {
    /// Repository over the shared store and cache.
    pub fn new(store: ResilientStore, cache: Arc<LeagueCache>) -> Self {
        Self { store, cache }
    }

    async fn participant_rows(&self) -> Result<Arc<Vec<ParticipantEntity>>, StorageError> {
        let store = self.store.clone();
        self.cache
            .participants
            .get_or_fetch(DatasetKey::Participants, false, || async move {
                Ok::<_, StorageError>(Arc::new(store.list_participants().await?))
            })
            .await
    }

    async fn assignment_rows(&self) -> Result<Arc<Vec<AssignmentEntity>>, StorageError> {
        let store = self.store.clone();
        self.cache
            .assignments
            .get_or_fetch(DatasetKey::Assignments, false, || async move {
                Ok::<_, StorageError>(Arc::new(store.list_assignments().await?))
            })
            .await
    }

    /// Raw Users row of `participant_id`, credential included.
    pub async fn find_row(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Option<ParticipantEntity>, StorageError> {
        let rows = self.participant_rows().await?;
        Ok(rows
            .iter()
            .find(|row| row.id.trim() == participant_id.as_str())
            .cloned())
    }

    /// Participant with its group resolved, or `None` when unknown.
    ///
    /// A Users row without a group falls back to the participant's Assignments row.
    pub async fn find(&self, participant_id: &ParticipantId) -> Result<Option<Participant>, StorageError> {
        let Some(row) = self.find_row(participant_id).await? else {
            return Ok(None);
        };
        let mut participant = Participant::from(&row);
        if participant.group_tag.is_unassigned() {
            if let Some(group_tag) = self.assigned_group(participant_id).await? {
                participant.group_tag = group_tag;
            }
        }
        Ok(Some(participant))
    }

    /// Group recorded for the participant in the Assignments table.
    pub async fn assigned_group(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Option<GroupTag>, StorageError> {
        let rows = self.assignment_rows().await?;
        Ok(rows
            .iter()
            .filter(|row| row.participant_id.trim() == participant_id.as_str())
            .filter_map(|row| row.group_tag.as_deref().map(str::trim))
            .find(|tag| !tag.is_empty())
            .map(GroupTag::from))
    }

    /// Display name of every participant, keyed by id.
    pub async fn display_names(&self) -> Result<HashMap<ParticipantId, String>, StorageError> {
        let rows = self.participant_rows().await?;
        Ok(rows
            .iter()
            .filter(|row| !row.id.trim().is_empty())
            .map(|row| {
                let participant = Participant::from(row);
                (participant.id, participant.display_name)
            })
            .collect())
    }
}
