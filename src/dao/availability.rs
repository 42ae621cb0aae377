use std::{collections::HashSet, sync::Arc};

use thiserror::Error;
use time::Date;
use tracing::{info, warn};

use crate::{
    dao::{
        cache::{DatasetKey, LeagueCache},
        conversion::{window_from_entity, window_to_entity},
        resilient::ResilientStore,
        storage::StorageError,
    },
    state::{
        availability::AvailabilityIndex,
        calendar::{MinuteOfDay, format_date},
        clock::Clock,
        league::{AvailabilityWindow, GroupTag, ParticipantId},
    },
};

/// Rules applied to availability reads and submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityRules {
    /// End substituted for rows stored without one.
    pub grid_end: MinuteOfDay,
    /// Width of the calendar grid slots submitted times must fall on.
    pub slot_minutes: u16,
    /// Drop every owner's past rows after a successful submission.
    pub prune_past_dates: bool,
}

impl Default for AvailabilityRules {
    fn default() -> Self {
        Self {
            grid_end: MinuteOfDay::from_hm(23, 0).unwrap_or(MinuteOfDay::MIDNIGHT),
            slot_minutes: 30,
            prune_past_dates: true,
        }
    }
}

/// Rejections of an availability submission.
#[derive(Debug, Error)]
pub enum AvailabilityError {
    /// Store failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// A window names another participant.
    #[error("window on {date} belongs to `{owner}`, not `{participant_id}`")]
    ForeignWindow {
        /// Participant the submission is for.
        participant_id: ParticipantId,
        /// Participant named by the window.
        owner: ParticipantId,
        /// Date of the offending window.
        date: Date,
    },
    /// Two windows on the same date.
    #[error("more than one window submitted for {date}")]
    DuplicateDate {
        /// Date submitted more than once.
        date: Date,
    },
    /// A bound is not a multiple of the slot size.
    #[error("time {time} on {date} is not on the {slot_minutes}-minute grid")]
    OffGrid {
        /// Date of the offending window.
        date: Date,
        /// Offending bound.
        time: MinuteOfDay,
        /// Grid size in minutes.
        slot_minutes: u16,
    },
    /// Dated before today.
    #[error("{date} is in the past")]
    PastDate {
        /// Date of the offending window.
        date: Date,
    },
}

/// Reads and replaces participants' availability windows.
#[derive(Clone)]
pub struct AvailabilityRepository {
    store: ResilientStore,
    cache: Arc<LeagueCache>,
    clock: Arc<dyn Clock>,
    rules: AvailabilityRules,
}

impl AvailabilityRepository {
    /// Repository over the shared store, cache and clock.
    pub fn new(
        store: ResilientStore,
        cache: Arc<LeagueCache>,
        clock: Arc<dyn Clock>,
        rules: AvailabilityRules,
    ) -> Self {
        Self {
            store,
            cache,
            clock,
            rules,
        }
    }

    /// Every readable window in the store, served from the whole-table snapshot.
    pub async fn all_windows(&self) -> Result<Arc<Vec<AvailabilityWindow>>, StorageError> {
        let store = self.store.clone();
        let grid_end = self.rules.grid_end;
        self.cache
            .availability
            .get_or_fetch(DatasetKey::Availability, false, || async move {
                let rows = store.list_availability().await?;
                let windows: Vec<_> = rows
                    .iter()
                    .filter_map(|row| window_from_entity(row, grid_end))
                    .collect();
                Ok::<_, StorageError>(Arc::new(windows))
            })
            .await
    }

    /// Windows of one participant, sorted by date.
    pub async fn get_windows(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Vec<AvailabilityWindow>, StorageError> {
        let all = self.all_windows().await?;
        let mut windows: Vec<_> = all
            .iter()
            .filter(|window| window.participant_id() == participant_id)
            .cloned()
            .collect();
        windows.sort_by_key(AvailabilityWindow::date);
        Ok(windows)
    }

    /// Index of every window by participant and date.
    pub async fn availability_index(&self) -> Result<AvailabilityIndex, StorageError> {
        let all = self.all_windows().await?;
        Ok(AvailabilityIndex::from_windows(all.iter()))
    }

    /// Replace everything `participant_id` has submitted with `windows`.
    ///
    /// An empty submission removes all of the participant's windows.
    pub async fn replace_windows(
        &self,
        participant_id: &ParticipantId,
        group_tag: &GroupTag,
        mut windows: Vec<AvailabilityWindow>,
    ) -> Result<Vec<AvailabilityWindow>, AvailabilityError> {
        let today = self.clock.today();
        self.validate(participant_id, today, &windows)?;
        windows.sort_by_key(AvailabilityWindow::date);

        let rows = windows
            .iter()
            .map(|window| window_to_entity(window, group_tag))
            .collect();
        let group = (!group_tag.is_unassigned()).then(|| group_tag.as_str());
        let result = self
            .store
            .replace_availability(participant_id.as_str(), group, rows)
            .await;
        self.cache.invalidate(Some(DatasetKey::Availability));
        result?;

        info!(
            participant_id = %participant_id,
            windows = windows.len(),
            "availability replaced"
        );

        if self.rules.prune_past_dates {
            match self
                .store
                .prune_availability_before(&format_date(today))
                .await
            {
                Ok(0) => {}
                Ok(removed) => {
                    info!(removed, "pruned past availability");
                    self.cache.invalidate(Some(DatasetKey::Availability));
                }
                Err(err) => warn!(error = %err, "failed to prune past availability"),
            }
        }

        Ok(windows)
    }

    fn validate(
        &self,
        participant_id: &ParticipantId,
        today: Date,
        windows: &[AvailabilityWindow],
    ) -> Result<(), AvailabilityError> {
        let mut seen = HashSet::new();
        for window in windows {
            let date = window.date();
            if window.participant_id() != participant_id {
                return Err(AvailabilityError::ForeignWindow {
                    participant_id: participant_id.clone(),
                    owner: window.participant_id().clone(),
                    date,
                });
            }
            if !seen.insert(date) {
                return Err(AvailabilityError::DuplicateDate { date });
            }
            if date < today {
                return Err(AvailabilityError::PastDate { date });
            }
            for time in [window.start(), window.end()] {
                if !time.is_on_grid(self.rules.slot_minutes) {
                    return Err(AvailabilityError::OffGrid {
                        date,
                        time,
                        slot_minutes: self.rules.slot_minutes,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::{
            league_store::memory::{MemoryLeagueStore, MemoryTables},
            models::AvailabilityEntity,
            retry::RetryPolicy,
        },
        state::clock::FixedClock,
    };
    use std::time::Duration;
    use time::macros::date;

    fn repository(memory: &MemoryLeagueStore) -> AvailabilityRepository {
        AvailabilityRepository::new(
            ResilientStore::new(Arc::new(memory.clone()), RetryPolicy::default()),
            Arc::new(LeagueCache::new(Duration::from_secs(300))),
            Arc::new(FixedClock(date!(2026 - 02 - 09))),
            AvailabilityRules::default(),
        )
    }

    fn window(participant: &str, date: Date, start: &str, end: &str) -> AvailabilityWindow {
        AvailabilityWindow::new(
            participant.into(),
            date,
            start.parse().unwrap(),
            end.parse().unwrap(),
        )
        .unwrap()
    }

    fn row(participant: &str, date: &str) -> AvailabilityEntity {
        AvailabilityEntity {
            participant_id: participant.into(),
            date: date.into(),
            start_time: "18:00".into(),
            end_time: Some("20:00".into()),
            group_tag: None,
        }
    }

    #[tokio::test]
    async fn replace_is_visible_to_the_next_read() {
        let memory = MemoryLeagueStore::new();
        let repo = repository(&memory);
        let p1 = ParticipantId::from("P1");
        assert!(repo.get_windows(&p1).await.unwrap().is_empty());

        repo.replace_windows(
            &p1,
            &"LEVEL-A".into(),
            vec![
                window("P1", date!(2026 - 02 - 12), "18:00", "20:00"),
                window("P1", date!(2026 - 02 - 10), "17:00", "21:00"),
            ],
        )
        .await
        .unwrap();

        let windows = repo.get_windows(&p1).await.unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].date(), date!(2026 - 02 - 10));
    }

    #[tokio::test]
    async fn empty_submission_clears_the_participant() {
        let memory = MemoryLeagueStore::with_tables(MemoryTables {
            availability: vec![row("P1", "2026-02-10"), row("P2", "2026-02-10")],
            ..MemoryTables::default()
        });
        let repo = repository(&memory);

        repo.replace_windows(&"P1".into(), &GroupTag::unassigned(), vec![])
            .await
            .unwrap();

        assert!(repo.get_windows(&"P1".into()).await.unwrap().is_empty());
        assert_eq!(repo.get_windows(&"P2".into()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn submission_prunes_past_rows_of_everyone() {
        let memory = MemoryLeagueStore::with_tables(MemoryTables {
            availability: vec![row("P2", "2026-02-01"), row("P2", "2026-02-10")],
            ..MemoryTables::default()
        });
        let repo = repository(&memory);

        repo.replace_windows(
            &"P1".into(),
            &GroupTag::unassigned(),
            vec![window("P1", date!(2026 - 02 - 10), "17:00", "21:00")],
        )
        .await
        .unwrap();

        let p2 = repo.get_windows(&"P2".into()).await.unwrap();
        assert_eq!(p2.len(), 1);
        assert_eq!(p2[0].date(), date!(2026 - 02 - 10));
    }

    #[tokio::test]
    async fn rejects_invalid_submissions() {
        let repo = repository(&MemoryLeagueStore::new());
        let p1 = ParticipantId::from("P1");
        let group = GroupTag::unassigned();

        let duplicate = repo
            .replace_windows(
                &p1,
                &group,
                vec![
                    window("P1", date!(2026 - 02 - 10), "17:00", "18:00"),
                    window("P1", date!(2026 - 02 - 10), "19:00", "21:00"),
                ],
            )
            .await;
        assert!(matches!(duplicate, Err(AvailabilityError::DuplicateDate { .. })));

        let off_grid = repo
            .replace_windows(
                &p1,
                &group,
                vec![window("P1", date!(2026 - 02 - 10), "17:15", "18:00")],
            )
            .await;
        assert!(matches!(off_grid, Err(AvailabilityError::OffGrid { .. })));

        let past = repo
            .replace_windows(
                &p1,
                &group,
                vec![window("P1", date!(2026 - 02 - 08), "17:00", "18:00")],
            )
            .await;
        assert!(matches!(past, Err(AvailabilityError::PastDate { .. })));

        let foreign = repo
            .replace_windows(
                &p1,
                &group,
                vec![window("P2", date!(2026 - 02 - 10), "17:00", "18:00")],
            )
            .await;
        assert!(matches!(foreign, Err(AvailabilityError::ForeignWindow { .. })));
    }
}
