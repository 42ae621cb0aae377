use std::sync::Arc;

use crate::dao::{
    league_store::LeagueStore,
    models::{
        AssignmentEntity, AvailabilityEntity, FixtureEntity, FixtureUpdate, ParticipantEntity,
        UpdateOutcome,
    },
    retry::{RetryPolicy, with_retry},
    storage::StorageResult,
};

/// Store handle that applies the retry policy to every call.
#[derive(Clone)]
pub struct ResilientStore {
    inner: Arc<dyn LeagueStore>,
    policy: RetryPolicy,
}

impl ResilientStore {
    /// Wrap `store`, retrying transient failures under `policy`.
    pub fn new(inner: Arc<dyn LeagueStore>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Retry policy in use.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// See [`LeagueStore::list_participants`].
    pub async fn list_participants(&self) -> StorageResult<Vec<ParticipantEntity>> {
        with_retry(&self.policy, "list_participants", || {
            self.inner.list_participants()
        })
        .await
    }

    /// See [`LeagueStore::list_assignments`].
    pub async fn list_assignments(&self) -> StorageResult<Vec<AssignmentEntity>> {
        with_retry(&self.policy, "list_assignments", || self.inner.list_assignments()).await
    }

    /// See [`LeagueStore::list_availability`].
    pub async fn list_availability(&self) -> StorageResult<Vec<AvailabilityEntity>> {
        with_retry(&self.policy, "list_availability", || {
            self.inner.list_availability()
        })
        .await
    }

    /// See [`LeagueStore::replace_availability`].
    pub async fn replace_availability(
        &self,
        participant_id: &str,
        group_tag: Option<&str>,
        rows: Vec<AvailabilityEntity>,
    ) -> StorageResult<()> {
        with_retry(&self.policy, "replace_availability", || {
            self.inner.replace_availability(
                participant_id.to_string(),
                group_tag.map(str::to_string),
                rows.clone(),
            )
        })
        .await
    }

    /// See [`LeagueStore::prune_availability_before`].
    pub async fn prune_availability_before(&self, date: &str) -> StorageResult<usize> {
        with_retry(&self.policy, "prune_availability_before", || {
            self.inner.prune_availability_before(date.to_string())
        })
        .await
    }

    /// See [`LeagueStore::list_fixtures`].
    pub async fn list_fixtures(&self) -> StorageResult<Vec<FixtureEntity>> {
        with_retry(&self.policy, "list_fixtures", || self.inner.list_fixtures()).await
    }

    /// See [`LeagueStore::update_fixture`].
    pub async fn update_fixture(&self, update: FixtureUpdate) -> StorageResult<UpdateOutcome> {
        with_retry(&self.policy, "update_fixture", || {
            self.inner.update_fixture(update.clone())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::league_store::memory::MemoryLeagueStore;

    #[tokio::test(start_paused = true)]
    async fn retries_through_injected_failures() {
        let memory = MemoryLeagueStore::new();
        memory.fail_next(2);
        let store = ResilientStore::new(Arc::new(memory.clone()), RetryPolicy::default());

        assert!(store.list_fixtures().await.unwrap().is_empty());
        assert_eq!(memory.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn surfaces_the_last_error_when_exhausted() {
        let memory = MemoryLeagueStore::new();
        memory.fail_next(5);
        let store = ResilientStore::new(Arc::new(memory.clone()), RetryPolicy::default());

        assert!(store.list_participants().await.unwrap_err().is_transient());
        assert_eq!(memory.call_count(), 3);
    }
}
