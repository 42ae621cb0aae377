//! In-process store used for local runs and tests.

use std::{
    collections::BTreeMap,
    io,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use futures::future::BoxFuture;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::dao::{
    league_store::LeagueStore,
    models::{
        AssignmentEntity, AvailabilityEntity, FixtureEntity, FixtureUpdate, ParticipantEntity,
        UpdateOutcome,
    },
    storage::{StorageError, StorageResult},
};

/// Initial contents of a [`MemoryLeagueStore`], also readable from a JSON seed file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MemoryTables {
    /// Users rows.
    pub participants: Vec<ParticipantEntity>,
    /// Assignments rows.
    pub assignments: Vec<AssignmentEntity>,
    /// Flat availability rows; partitioned by owner on load.
    pub availability: Vec<AvailabilityEntity>,
    /// Fixtures rows.
    pub fixtures: Vec<FixtureEntity>,
}

#[derive(Debug, Default)]
struct Tables {
    participants: Vec<ParticipantEntity>,
    assignments: Vec<AssignmentEntity>,
    /// Availability partitioned by participant id.
    availability: BTreeMap<String, Vec<AvailabilityEntity>>,
    fixtures: Vec<FixtureEntity>,
}

/// [`LeagueStore`] kept in process memory, with failure injection for tests.
#[derive(Clone, Default)]
pub struct MemoryLeagueStore {
    tables: Arc<RwLock<Tables>>,
    injected_failures: Arc<AtomicUsize>,
    lost_acks: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
}

impl MemoryLeagueStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the given rows.
    pub fn with_tables(tables: MemoryTables) -> Self {
        let mut availability: BTreeMap<String, Vec<AvailabilityEntity>> = BTreeMap::new();
        for row in tables.availability {
            availability
                .entry(row.participant_id.clone())
                .or_default()
                .push(row);
        }

        Self {
            tables: Arc::new(RwLock::new(Tables {
                participants: tables.participants,
                assignments: tables.assignments,
                availability,
                fixtures: tables.fixtures,
            })),
            ..Self::default()
        }
    }

    /// Make the next `count` operations fail with a transient error.
    pub fn fail_next(&self, count: usize) {
        self.injected_failures.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` fixture updates apply their write and then
    /// report a transient error, as when a response is lost in transit.
    pub fn lose_next_acks(&self, count: usize) {
        self.lost_acks.store(count, Ordering::SeqCst);
    }

    /// Number of operations attempted so far, failed ones included.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check_injected_failure(&self) -> StorageResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self
            .injected_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match remaining {
            Ok(_) => Err(StorageError::transient(
                "injected failure".into(),
                io::Error::new(io::ErrorKind::TimedOut, "injected failure"),
            )),
            Err(_) => Ok(()),
        }
    }
}

impl LeagueStore for MemoryLeagueStore {
    fn list_participants(&self) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_injected_failure()?;
            Ok(store.tables.read().await.participants.clone())
        })
    }

    fn list_assignments(&self) -> BoxFuture<'static, StorageResult<Vec<AssignmentEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_injected_failure()?;
            Ok(store.tables.read().await.assignments.clone())
        })
    }

    fn list_availability(&self) -> BoxFuture<'static, StorageResult<Vec<AvailabilityEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_injected_failure()?;
            let tables = store.tables.read().await;
            let mut rows: Vec<AvailabilityEntity> =
                tables.availability.values().flatten().cloned().collect();
            rows.sort_by(|a, b| a.date.cmp(&b.date));
            Ok(rows)
        })
    }

    fn replace_availability(
        &self,
        participant_id: String,
        _group_tag: Option<String>,
        rows: Vec<AvailabilityEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_injected_failure()?;
            let mut tables = store.tables.write().await;
            if rows.is_empty() {
                tables.availability.remove(&participant_id);
            } else {
                tables.availability.insert(participant_id, rows);
            }
            Ok(())
        })
    }

    fn prune_availability_before(&self, date: String) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_injected_failure()?;
            let mut tables = store.tables.write().await;
            let mut removed = 0;
            for rows in tables.availability.values_mut() {
                let before = rows.len();
                rows.retain(|row| row.date >= date);
                removed += before - rows.len();
            }
            tables.availability.retain(|_, rows| !rows.is_empty());
            Ok(removed)
        })
    }

    fn list_fixtures(&self) -> BoxFuture<'static, StorageResult<Vec<FixtureEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_injected_failure()?;
            Ok(store.tables.read().await.fixtures.clone())
        })
    }

    fn update_fixture(
        &self,
        update: FixtureUpdate,
    ) -> BoxFuture<'static, StorageResult<UpdateOutcome>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_injected_failure()?;
            let mut tables = store.tables.write().await;
            let Some(fixture) = tables
                .fixtures
                .iter_mut()
                .find(|fixture| fixture.fixture_id == update.fixture_id)
            else {
                return Ok(UpdateOutcome::NotFound);
            };

            if fixture.state_token() != update.expected_state {
                return Ok(UpdateOutcome::Conflict {
                    actual: fixture.state_token().to_string(),
                });
            }

            fixture.state = Some(update.state);
            fixture.scheduled_date = update.scheduled_date;
            fixture.scheduled_time = update.scheduled_time;

            let lost = store
                .lost_acks
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
            if lost.is_ok() {
                return Err(StorageError::transient(
                    "update acknowledgement lost".into(),
                    io::Error::new(io::ErrorKind::TimedOut, "acknowledgement lost"),
                ));
            }
            Ok(UpdateOutcome::Applied)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
