use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::from_value;
use tracing::{debug, warn};

use crate::dao::{
    league_store::LeagueStore,
    models::{
        AssignmentEntity, AvailabilityEntity, FixtureEntity, FixtureUpdate, ParticipantEntity,
        UpdateOutcome,
    },
    storage::StorageResult,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        ASSIGNMENT_PREFIX, AVAILABILITY_PREFIX, AllDocsResponse, AvailabilityBody,
        AvailabilityDocument, CouchDocument, END_SUFFIX, FIXTURE_PREFIX, FixtureDocument,
        PARTICIPANT_PREFIX, availability_doc_id, fixture_doc_id,
    },
};

/// Attempts at writing a participant's availability document when its revision keeps moving.
const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Outcome of a revision-guarded write.
enum PutOutcome {
    Written,
    Conflict,
}

/// [`LeagueStore`] backed by a CouchDB database.
#[derive(Clone)]
pub struct CouchLeagueStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchLeagueStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url);
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url,
            database,
            auth,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn with_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some((ref user, ref pass)) = self.auth {
            builder.basic_auth(user.as_ref(), Some(pass.as_ref()))
        } else {
            builder
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, self.database, path);
        self.with_auth(self.client.request(method, url))
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = format!("{}/{}", self.base_url, self.database);

        let response = self
            .with_auth(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .with_auth(self.client.put(&url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::RequestSend {
                        path: database.clone(),
                        source,
                    })?;
                if create.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    /// PUT a document. A `409` means the `_rev` carried by `document` is stale.
    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<PutOutcome>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::CONFLICT => Ok(PutOutcome::Conflict),
            status if status.is_success() => Ok(PutOutcome::Written),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn list_documents<T>(&self, prefix: &str) -> CouchResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        const ALL_DOCS: &str = "_all_docs";
        let query = [
            ("include_docs", "true".to_string()),
            ("startkey", format!("\"{}\"", prefix)),
            ("endkey", format!("\"{}{}\"", prefix, END_SUFFIX)),
        ];

        let response = self
            .request(Method::GET, ALL_DOCS)
            .query(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: ALL_DOCS.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: ALL_DOCS.to_string(),
                status: response.status(),
            });
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                path: ALL_DOCS.to_string(),
                source,
            }
        })?;

        let mut documents = Vec::new();
        for row in payload.rows {
            if let Some(doc) = row.doc {
                let parsed = from_value(doc).map_err(|source| CouchDaoError::DeserializeValue {
                    path: ALL_DOCS.to_string(),
                    source,
                })?;
                documents.push(parsed);
            }
        }

        Ok(documents)
    }

    async fn write_availability(
        &self,
        participant_id: String,
        group_tag: Option<String>,
        rows: Vec<AvailabilityEntity>,
    ) -> CouchResult<()> {
        let doc_id = availability_doc_id(&participant_id);
        let body = AvailabilityBody::from_rows(participant_id, group_tag, rows);

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let rev = self
                .get_document::<AvailabilityDocument>(&doc_id)
                .await?
                .and_then(|existing| existing.rev);
            let doc = CouchDocument {
                id: doc_id.clone(),
                rev,
                body: body.clone(),
            };
            match self.put_document(&doc_id, &doc).await? {
                PutOutcome::Written => return Ok(()),
                PutOutcome::Conflict => {
                    debug!(%doc_id, attempt, "availability document revision moved; retrying");
                }
            }
        }

        Err(CouchDaoError::PersistentConflict {
            path: doc_id,
            attempts: MAX_WRITE_ATTEMPTS,
        })
    }

    async fn guarded_fixture_update(&self, update: FixtureUpdate) -> CouchResult<UpdateOutcome> {
        let doc_id = fixture_doc_id(&update.fixture_id);
        let Some(mut doc) = self.get_document::<FixtureDocument>(&doc_id).await? else {
            return Ok(UpdateOutcome::NotFound);
        };
        if doc.body.state_token() != update.expected_state {
            return Ok(UpdateOutcome::Conflict {
                actual: doc.body.state_token().to_string(),
            });
        }

        doc.body.state = Some(update.state);
        doc.body.scheduled_date = update.scheduled_date;
        doc.body.scheduled_time = update.scheduled_time;

        match self.put_document(&doc_id, &doc).await? {
            PutOutcome::Written => Ok(UpdateOutcome::Applied),
            PutOutcome::Conflict => {
                // Another writer got in first; report what it left behind.
                let actual = self
                    .get_document::<FixtureDocument>(&doc_id)
                    .await?
                    .map(|current| current.body.state_token().to_string());
                Ok(match actual {
                    Some(actual) => UpdateOutcome::Conflict { actual },
                    None => UpdateOutcome::NotFound,
                })
            }
        }
    }
}

impl LeagueStore for CouchLeagueStore {
    fn list_participants(&self) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let docs = store
                .list_documents::<CouchDocument<ParticipantEntity>>(PARTICIPANT_PREFIX)
                .await?;
            Ok(docs.into_iter().map(|doc| doc.body).collect())
        })
    }

    fn list_assignments(&self) -> BoxFuture<'static, StorageResult<Vec<AssignmentEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let docs = store
                .list_documents::<CouchDocument<AssignmentEntity>>(ASSIGNMENT_PREFIX)
                .await?;
            Ok(docs.into_iter().map(|doc| doc.body).collect())
        })
    }

    fn list_availability(&self) -> BoxFuture<'static, StorageResult<Vec<AvailabilityEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let docs = store
                .list_documents::<AvailabilityDocument>(AVAILABILITY_PREFIX)
                .await?;
            let mut rows: Vec<AvailabilityEntity> =
                docs.into_iter().flat_map(|doc| doc.body.into_rows()).collect();
            rows.sort_by(|a, b| a.date.cmp(&b.date));
            Ok(rows)
        })
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
                .write_availability(participant_id, group_tag, rows)
                .await
                .map_err(Into::into)
        })
    }

    fn prune_availability_before(&self, date: String) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move {
            let docs = store
                .list_documents::<AvailabilityDocument>(AVAILABILITY_PREFIX)
                .await?;

            let mut removed = 0;
            for mut doc in docs {
                let dropped = doc.body.prune_before(&date);
                if dropped == 0 {
                    continue;
                }
                let doc_id = doc.id.clone();
                match store.put_document(&doc_id, &doc).await? {
                    PutOutcome::Written => removed += dropped,
                    // The owner replaced the document meanwhile; the next prune will see it.
                    PutOutcome::Conflict => warn!(%doc_id, "skipped pruning a concurrently replaced document"),
                }
            }
            Ok(removed)
        })
    }

    fn list_fixtures(&self) -> BoxFuture<'static, StorageResult<Vec<FixtureEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let docs = store
                .list_documents::<FixtureDocument>(FIXTURE_PREFIX)
                .await?;
            Ok(docs.into_iter().map(|doc| doc.body).collect())
        })
    }

    fn update_fixture(
        &self,
        update: FixtureUpdate,
    ) -> BoxFuture<'static, StorageResult<UpdateOutcome>> {
        let store = self.clone();
        Box::pin(async move { store.guarded_fixture_update(update).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = format!("{}/{}", store.base_url, store.database);
            let response = store
                .with_auth(store.client.get(&url))
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    path: url.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    path: url,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
