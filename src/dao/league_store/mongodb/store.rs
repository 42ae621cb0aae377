use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Bson, Document, doc},
    options::IndexOptions,
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::MongoAvailabilityDocument,
};
use crate::dao::{
    league_store::LeagueStore,
    models::{
        AssignmentEntity, AvailabilityEntity, FixtureEntity, FixtureUpdate, PENDING_TOKEN,
        ParticipantEntity, UpdateOutcome,
    },
    storage::StorageResult,
};

const PARTICIPANTS: &str = "participants";
const ASSIGNMENTS: &str = "assignments";
const AVAILABILITY: &str = "availability";
const FIXTURES: &str = "fixtures";

/// [`LeagueStore`] backed by MongoDB collections.
#[derive(Clone)]
pub struct MongoLeagueStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    database: RwLock<Database>,
    config: MongoConfig,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = self.database.read().await.clone();
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (_client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        *self.database.write().await = database;
        Ok(())
    }
}

impl MongoLeagueStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (_client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let store = Self {
            inner: Arc::new(MongoInner {
                database: RwLock::new(database),
                config,
            }),
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.inner.database.read().await.clone();
        for (collection, field, name) in [
            (PARTICIPANTS, "id", "participant_id_idx"),
            (FIXTURES, "fixture_id", "fixture_id_idx"),
        ] {
            let mut keys = Document::new();
            keys.insert(field, 1);
            let index = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(name.to_owned()))
                        .unique(Some(true))
                        .build(),
                )
                .build();
            database
                .collection::<Document>(collection)
                .create_index(index)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index: field,
                    source,
                })?;
        }
        Ok(())
    }

    async fn collection<T>(&self, name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.inner.database.read().await.collection::<T>(name)
    }

    async fn list_all<T>(&self, collection: &'static str) -> MongoResult<Vec<T>>
    where
        T: DeserializeOwned + Serialize + Send + Sync + Unpin,
    {
        self.collection::<T>(collection)
            .await
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::Read { collection, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Read { collection, source })
    }

    async fn list_availability(&self) -> MongoResult<Vec<AvailabilityEntity>> {
        let documents = self.list_all::<MongoAvailabilityDocument>(AVAILABILITY).await?;
        let mut rows: Vec<AvailabilityEntity> = documents
            .into_iter()
            .flat_map(MongoAvailabilityDocument::into_rows)
            .collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(rows)
    }

    async fn replace_availability(
        &self,
        participant_id: String,
        group_tag: Option<String>,
        rows: Vec<AvailabilityEntity>,
    ) -> MongoResult<()> {
        let document = MongoAvailabilityDocument::new(participant_id, group_tag, rows);
        self.collection::<MongoAvailabilityDocument>(AVAILABILITY)
            .await
            .replace_one(doc! { "_id": document.participant_id.as_str() }, &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: AVAILABILITY,
                source,
            })?;
        Ok(())
    }

    async fn prune_availability_before(&self, date: String) -> MongoResult<usize> {
        let collection = self
            .collection::<MongoAvailabilityDocument>(AVAILABILITY)
            .await;
        let stale_filter = doc! { "windows.date": { "$lt": date.as_str() } };

        let stale: Vec<MongoAvailabilityDocument> = collection
            .find(stale_filter.clone())
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: AVAILABILITY,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: AVAILABILITY,
                source,
            })?;
        if stale.is_empty() {
            return Ok(0);
        }
        let removed: usize = stale.iter().map(|entry| entry.stale_before(&date)).sum();

        collection
            .update_many(
                stale_filter,
                doc! { "$pull": { "windows": { "date": { "$lt": date.as_str() } } } },
            )
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: AVAILABILITY,
                source,
            })?;
        Ok(removed)
    }

    async fn update_fixture(&self, update: FixtureUpdate) -> MongoResult<UpdateOutcome> {
        let collection = self.collection::<FixtureEntity>(FIXTURES).await;

        let result = collection
            .update_one(
                state_guard(&update.fixture_id, &update.expected_state),
                doc! { "$set": {
                    "state": update.state.as_str(),
                    "scheduled_date": update.scheduled_date.clone(),
                    "scheduled_time": update.scheduled_time.clone(),
                } },
            )
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: FIXTURES,
                source,
            })?;
        if result.matched_count > 0 {
            return Ok(UpdateOutcome::Applied);
        }

        let current = collection
            .find_one(doc! { "fixture_id": update.fixture_id.as_str() })
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: FIXTURES,
                source,
            })?;
        Ok(match current {
            Some(fixture) => UpdateOutcome::Conflict {
                actual: fixture.state_token().to_string(),
            },
            None => UpdateOutcome::NotFound,
        })
    }
}

/// Filter matching the fixture while its stored token, trimmed, equals `expected`.
///
/// Missing, null and blank states count as pending.
fn state_guard(fixture_id: &str, expected: &str) -> Document {
    let token = regex::escape(expected);
    if expected == PENDING_TOKEN {
        doc! {
            "fixture_id": fixture_id,
            "$or": [
                { "state": Bson::Null },
                { "state": { "$regex": format!(r"^\s*({token})?\s*$") } },
            ],
        }
    } else {
        doc! {
            "fixture_id": fixture_id,
            "state": { "$regex": format!(r"^\s*{token}\s*$") },
        }
    }
}

impl LeagueStore for MongoLeagueStore {
    fn list_participants(&self) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_all(PARTICIPANTS).await.map_err(Into::into) })
    }

    fn list_assignments(&self) -> BoxFuture<'static, StorageResult<Vec<AssignmentEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_all(ASSIGNMENTS).await.map_err(Into::into) })
    }

    fn list_availability(&self) -> BoxFuture<'static, StorageResult<Vec<AvailabilityEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_availability().await.map_err(Into::into) })
    }

    fn replace_availability(
        &self,
        participant_id: String,
        group_tag: Option<String>,
        rows: Vec<AvailabilityEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .replace_availability(participant_id, group_tag, rows)
                .await
                .map_err(Into::into)
        })
    }

    fn prune_availability_before(&self, date: String) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .prune_availability_before(date)
                .await
                .map_err(Into::into)
        })
    }

    fn list_fixtures(&self) -> BoxFuture<'static, StorageResult<Vec<FixtureEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_all(FIXTURES).await.map_err(Into::into) })
    }

    fn update_fixture(
        &self,
        update: FixtureUpdate,
    ) -> BoxFuture<'static, StorageResult<UpdateOutcome>> {
        let store = self.clone();
        Box::pin(async move { store.update_fixture(update).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
