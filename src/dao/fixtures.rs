use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    dao::{
        cache::{DatasetKey, LeagueCache},
        conversion::{fixture_from_entity, fixture_update},
        models::UpdateOutcome,
        resilient::ResilientStore,
        storage::StorageError,
    },
    state::{
        clock::Clock,
        league::{Fixture, FixtureId, FixtureState, GroupTag, ParticipantFixtures, ParticipantId, Schedule},
        lifecycle::{FixtureEvent, InvalidTransition},
    },
};

/// Failures of a fixture transition.
#[derive(Debug, Error)]
pub enum FixtureRepositoryError {
    /// Store failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The event is not allowed from the stored state.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    /// The stored state kept changing underneath the transition.
    #[error("fixture `{fixture_id}` changed concurrently (expected {expected}, found {actual})")]
    Conflict {
        /// Fixture being transitioned.
        fixture_id: FixtureId,
        /// State the transition started from.
        expected: FixtureState,
        /// Stored state token found on the re-read.
        actual: String,
    },
}

/// Reads fixtures and drives their lifecycle through the store.
#[derive(Clone)]
pub struct FixtureRepository {
    store: ResilientStore,
    cache: Arc<LeagueCache>,
    clock: Arc<dyn Clock>,
}

impl FixtureRepository {
    /// Repository over the shared store, cache and clock.
    pub fn new(store: ResilientStore, cache: Arc<LeagueCache>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            cache,
            clock,
        }
    }

    /// Every readable fixture, served from the whole-table snapshot.
    pub async fn all_fixtures(&self, force_refresh: bool) -> Result<Arc<Vec<Fixture>>, StorageError> {
        let store = self.store.clone();
        self.cache
            .fixtures
            .get_or_fetch(DatasetKey::Fixtures, force_refresh, || async move {
                let rows = store.list_fixtures().await?;
                let fixtures: Vec<_> = rows.iter().filter_map(fixture_from_entity).collect();
                Ok::<_, StorageError>(Arc::new(fixtures))
            })
            .await
    }

    /// One fixture by id, from the snapshot.
    pub async fn get_fixture(&self, fixture_id: &FixtureId) -> Result<Option<Fixture>, StorageError> {
        self.find(fixture_id, false).await
    }

    /// Fixtures of one group, in store order.
    pub async fn fixtures_for_group(&self, group_tag: &GroupTag) -> Result<Vec<Fixture>, StorageError> {
        let all = self.all_fixtures(false).await?;
        Ok(all
            .iter()
            .filter(|fixture| &fixture.group_tag == group_tag)
            .cloned()
            .collect())
    }

    /// The participant's fixtures bucketed by state. Closed fixtures are left out.
    pub async fn get_fixtures_for_participant(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<ParticipantFixtures, StorageError> {
        let all = self.all_fixtures(false).await?;
        let mut buckets = ParticipantFixtures::default();
        for fixture in all.iter().filter(|fixture| fixture.includes(participant_id)) {
            match fixture.state {
                FixtureState::Pending => buckets.pending.push(fixture.clone()),
                FixtureState::Scheduled => buckets.scheduled.push(fixture.clone()),
                FixtureState::Played => buckets.played.push(fixture.clone()),
                FixtureState::Closed => {}
            }
        }
        Ok(buckets)
    }

    /// PENDING -> SCHEDULED. `Ok(None)` when the fixture does not exist.
    pub async fn confirm(
        &self,
        fixture_id: &FixtureId,
        schedule: Schedule,
    ) -> Result<Option<Fixture>, FixtureRepositoryError> {
        self.transition(fixture_id, FixtureEvent::Confirm(schedule)).await
    }

    /// SCHEDULED -> SCHEDULED with a new date and time.
    pub async fn edit(
        &self,
        fixture_id: &FixtureId,
        schedule: Schedule,
    ) -> Result<Option<Fixture>, FixtureRepositoryError> {
        self.transition(fixture_id, FixtureEvent::Edit(schedule)).await
    }

    /// SCHEDULED -> PENDING, clearing the schedule.
    pub async fn cancel(&self, fixture_id: &FixtureId) -> Result<Option<Fixture>, FixtureRepositoryError> {
        self.transition(fixture_id, FixtureEvent::Cancel).await
    }

    /// PENDING -> CLOSED.
    pub async fn close(&self, fixture_id: &FixtureId) -> Result<Option<Fixture>, FixtureRepositoryError> {
        self.transition(fixture_id, FixtureEvent::Close).await
    }

    /// Move every SCHEDULED fixture of the group dated before today to PLAYED.
    ///
    /// Returns how many fixtures this call advanced; a second call finds nothing to do.
    pub async fn advance_past_due(&self, group_tag: &GroupTag) -> Result<usize, StorageError> {
        let today = self.clock.today();
        let due: Vec<Fixture> = self
            .fixtures_for_group(group_tag)
            .await?
            .into_iter()
            .filter(|fixture| {
                fixture.state == FixtureState::Scheduled
                    && fixture.schedule.is_some_and(|schedule| schedule.date < today)
            })
            .collect();

        if due.is_empty() {
            return Ok(0);
        }

        let mut advanced = 0;
        let mut outcome = Ok(());
        for mut fixture in due {
            let Ok(from) = fixture.apply(FixtureEvent::MarkPlayed) else {
                continue;
            };
            match self.store.update_fixture(fixture_update(&fixture, from)).await {
                Ok(UpdateOutcome::Applied) => {
                    info!(fixture_id = %fixture.id, %from, to = %fixture.state, "fixture advanced");
                    advanced += 1;
                }
                Ok(UpdateOutcome::NotFound) => {
                    debug!(fixture_id = %fixture.id, "fixture vanished before it could be advanced");
                }
                Ok(UpdateOutcome::Conflict { actual }) => {
                    debug!(fixture_id = %fixture.id, %actual, "fixture already moved on");
                }
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            }
        }

        self.cache.invalidate(Some(DatasetKey::Fixtures));
        outcome.map(|()| advanced)
    }

    async fn find(&self, fixture_id: &FixtureId, force_refresh: bool) -> Result<Option<Fixture>, StorageError> {
        let all = self.all_fixtures(force_refresh).await?;
        Ok(all.iter().find(|fixture| &fixture.id == fixture_id).cloned())
    }

    /// Apply `event` against the stored fixture with a guarded write.
    ///
    /// A lost race re-reads the fixture and evaluates the event once more. If
    /// the re-read already shows the intended state and schedule, the earlier
    /// write landed (a retried update whose first acknowledgement was lost)
    /// and the stored fixture is returned.
    async fn transition(
        &self,
        fixture_id: &FixtureId,
        event: FixtureEvent,
    ) -> Result<Option<Fixture>, FixtureRepositoryError> {
        let mut force_refresh = false;
        let mut intended: Option<(FixtureState, Option<Schedule>)> = None;
        loop {
            let Some(mut fixture) = self.find(fixture_id, force_refresh).await? else {
                return Ok(None);
            };
            if intended == Some((fixture.state, fixture.schedule)) {
                info!(
                    fixture_id = %fixture_id,
                    event = event.name(),
                    state = %fixture.state,
                    "fixture already holds the requested change"
                );
                return Ok(Some(fixture));
            }
            let from = fixture.apply(event)?;
            intended = Some((fixture.state, fixture.schedule));

            let outcome = self.store.update_fixture(fixture_update(&fixture, from)).await;
            self.cache.invalidate(Some(DatasetKey::Fixtures));

            match outcome? {
                UpdateOutcome::Applied => {
                    info!(
                        fixture_id = %fixture_id,
                        event = event.name(),
                        %from,
                        to = %fixture.state,
                        "fixture transitioned"
                    );
                    return Ok(Some(fixture));
                }
                UpdateOutcome::NotFound => return Ok(None),
                UpdateOutcome::Conflict { actual } if !force_refresh => {
                    warn!(
                        fixture_id = %fixture_id,
                        expected = %from,
                        %actual,
                        "fixture changed concurrently; re-reading"
                    );
                    force_refresh = true;
                }
                UpdateOutcome::Conflict { actual } => {
                    return Err(FixtureRepositoryError::Conflict {
                        fixture_id: fixture_id.clone(),
                        expected: from,
                        actual,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::{
            league_store::{
                LeagueStore,
                memory::{MemoryLeagueStore, MemoryTables},
            },
            models::{FixtureEntity, FixtureUpdate},
            retry::RetryPolicy,
        },
        state::clock::FixedClock,
    };
    use std::time::Duration;
    use time::macros::date;

    fn entity(id: &str, state: &str, date: Option<&str>) -> FixtureEntity {
        FixtureEntity {
            fixture_id: id.into(),
            group_tag: Some("LEVEL-A".into()),
            player_ids: vec!["P1".into(), "P2".into(), "P3".into(), "P4".into()],
            scheduled_date: date.map(Into::into),
            scheduled_time: date.map(|_| "18:00".into()),
            state: Some(state.into()),
        }
    }

    fn repository(memory: &MemoryLeagueStore) -> FixtureRepository {
        FixtureRepository::new(
            ResilientStore::new(Arc::new(memory.clone()), RetryPolicy::default()),
            Arc::new(LeagueCache::new(Duration::from_secs(300))),
            Arc::new(FixedClock(date!(2026 - 02 - 10))),
        )
    }

    fn schedule(h: u16, m: u16) -> Schedule {
        Schedule {
            date: date!(2026 - 02 - 10),
            start: crate::state::calendar::MinuteOfDay::from_hm(h, m).unwrap(),
        }
    }

    #[tokio::test]
    async fn confirm_moves_fixture_into_scheduled_bucket() {
        let memory = MemoryLeagueStore::with_tables(MemoryTables {
            fixtures: vec![entity("F1", "PENDING", None)],
            ..MemoryTables::default()
        });
        let repo = repository(&memory);
        let p1 = ParticipantId::from("P1");

        assert_eq!(repo.get_fixtures_for_participant(&p1).await.unwrap().pending.len(), 1);

        let confirmed = repo
            .confirm(&"F1".into(), schedule(17, 30))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(confirmed.state, FixtureState::Scheduled);

        let buckets = repo.get_fixtures_for_participant(&p1).await.unwrap();
        assert!(buckets.pending.is_empty());
        assert_eq!(buckets.scheduled[0].schedule, Some(schedule(17, 30)));
    }

    #[tokio::test]
    async fn blank_stored_state_can_be_confirmed() {
        let memory = MemoryLeagueStore::with_tables(MemoryTables {
            fixtures: vec![entity("F1", "", None)],
            ..MemoryTables::default()
        });
        let repo = repository(&memory);
        let p1 = ParticipantId::from("P1");
        assert_eq!(repo.get_fixtures_for_participant(&p1).await.unwrap().pending.len(), 1);

        let confirmed = repo
            .confirm(&"F1".into(), schedule(17, 30))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(confirmed.state, FixtureState::Scheduled);
        assert_eq!(repo.get_fixtures_for_participant(&p1).await.unwrap().scheduled.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn confirm_whose_acknowledgement_was_lost_still_succeeds() {
        let memory = MemoryLeagueStore::with_tables(MemoryTables {
            fixtures: vec![entity("F1", "PENDING", None)],
            ..MemoryTables::default()
        });
        let repo = repository(&memory);
        memory.lose_next_acks(1);

        // The first write lands, its retry sees SCHEDULED and conflicts.
        let confirmed = repo
            .confirm(&"F1".into(), schedule(17, 30))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(confirmed.state, FixtureState::Scheduled);
        assert_eq!(confirmed.schedule, Some(schedule(17, 30)));

        // A different booking raced in: still reported as invalid.
        let again = repo.confirm(&"F1".into(), schedule(19, 0)).await;
        assert!(matches!(again, Err(FixtureRepositoryError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn unknown_fixture_is_a_sentinel() {
        let repo = repository(&MemoryLeagueStore::new());
        assert!(repo.confirm(&"F9".into(), schedule(17, 30)).await.unwrap().is_none());
        assert!(repo.cancel(&"F9".into()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn edit_of_pending_fixture_is_rejected() {
        let memory = MemoryLeagueStore::with_tables(MemoryTables {
            fixtures: vec![entity("F1", "PENDING", None)],
            ..MemoryTables::default()
        });
        let result = repository(&memory).edit(&"F1".into(), schedule(18, 0)).await;
        assert!(matches!(result, Err(FixtureRepositoryError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn stale_snapshot_is_reread_before_reporting() {
        let memory = MemoryLeagueStore::with_tables(MemoryTables {
            fixtures: vec![entity("F1", "PENDING", None)],
            ..MemoryTables::default()
        });
        let repo = repository(&memory);
        repo.all_fixtures(false).await.unwrap();

        // Another writer schedules the fixture behind the cached snapshot.
        memory
            .update_fixture(FixtureUpdate {
                fixture_id: "F1".into(),
                expected_state: "PENDING".into(),
                state: "SCHEDULED".into(),
                scheduled_date: Some("2026-02-11".into()),
                scheduled_time: Some("19:00".into()),
            })
            .await
            .unwrap();

        // Confirm loses the race and then fails on the fresh state.
        let confirm = repo.confirm(&"F1".into(), schedule(17, 30)).await;
        assert!(matches!(confirm, Err(FixtureRepositoryError::InvalidTransition(_))));

        // The failed confirm dropped the stale snapshot.
        let cancelled = repo.cancel(&"F1".into()).await.unwrap().unwrap();
        assert_eq!(cancelled.state, FixtureState::Pending);
        assert!(cancelled.schedule.is_none());
    }

    #[tokio::test]
    async fn advance_past_due_is_idempotent() {
        let memory = MemoryLeagueStore::with_tables(MemoryTables {
            fixtures: vec![
                entity("F1", "SCHEDULED", Some("2026-02-09")),
                entity("F2", "SCHEDULED", Some("2026-02-10")),
                entity("F3", "PENDING", None),
            ],
            ..MemoryTables::default()
        });
        let repo = repository(&memory);
        let group = GroupTag::from("LEVEL-A");

        assert_eq!(repo.advance_past_due(&group).await.unwrap(), 1);
        assert_eq!(repo.advance_past_due(&group).await.unwrap(), 0);

        let buckets = repo.get_fixtures_for_participant(&"P1".into()).await.unwrap();
        assert_eq!(buckets.played.len(), 1);
        assert_eq!(buckets.played[0].id, FixtureId::from("F1"));
        assert_eq!(buckets.scheduled.len(), 1);
        assert_eq!(buckets.pending.len(), 1);
    }
}
