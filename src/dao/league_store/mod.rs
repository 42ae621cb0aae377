/// CouchDB backend.
#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
/// MongoDB backend.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    AssignmentEntity, AvailabilityEntity, FixtureEntity, FixtureUpdate, ParticipantEntity,
    UpdateOutcome,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over the tabular store holding users, assignments, availability and fixtures.
///
/// Availability is partitioned by participant: a replace only ever touches the
/// rows of the participant it names.
pub trait LeagueStore: Send + Sync {
    /// Every Users row.
    fn list_participants(&self) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>>;
    /// Every Assignments row.
    fn list_assignments(&self) -> BoxFuture<'static, StorageResult<Vec<AssignmentEntity>>>;
    /// Every availability row, flattened across partitions.
    fn list_availability(&self) -> BoxFuture<'static, StorageResult<Vec<AvailabilityEntity>>>;
    /// Atomically replace every availability row owned by `participant_id`.
    fn replace_availability(
        &self,
        participant_id: String,
        group_tag: Option<String>,
        rows: Vec<AvailabilityEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Drop rows dated before `date` (ISO `YYYY-MM-DD`) for every owner. Returns the count removed.
    fn prune_availability_before(&self, date: String) -> BoxFuture<'static, StorageResult<usize>>;
    /// Every Fixtures row.
    fn list_fixtures(&self) -> BoxFuture<'static, StorageResult<Vec<FixtureEntity>>>;
    /// Write lifecycle fields if the stored state still matches `update.expected_state`.
    fn update_fixture(&self, update: FixtureUpdate) -> BoxFuture<'static, StorageResult<UpdateOutcome>>;
    /// Cheap connectivity probe.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the connection in place.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
