use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dao::models::{AvailabilityEntity, FixtureEntity};

/// Id prefix of Users documents.
pub const PARTICIPANT_PREFIX: &str = "participant::";
/// Id prefix of Assignments documents.
pub const ASSIGNMENT_PREFIX: &str = "assignment::";
/// Id prefix of availability partitions.
pub const AVAILABILITY_PREFIX: &str = "availability::";
/// Id prefix of fixture documents.
pub const FIXTURE_PREFIX: &str = "fixture::";
/// Upper bound appended to a prefix for `_all_docs` range scans.
pub const END_SUFFIX: &str = "\u{ffff}";

/// Body of an `_all_docs?include_docs=true` query.
#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    /// Matching rows.
    pub rows: Vec<AllDocsRow>,
}

/// One `_all_docs` row.
#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    /// Full document, absent for deleted rows.
    #[serde(default)]
    pub doc: Option<Value>,
}

/// A CouchDB document wrapping one of the league records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchDocument<T> {
    /// Prefixed document id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Revision, required to overwrite an existing document.
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// League record stored at the top level of the document.
    #[serde(flatten)]
    pub body: T,
}

/// Every availability window of one participant, stored as a single document
/// so that a replace is one atomic write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilityBody {
    /// Owner of the partition.
    pub participant_id: String,
    /// Group of the owner at write time.
    #[serde(default)]
    pub group_tag: Option<String>,
    /// Windows sorted by date.
    #[serde(default)]
    pub windows: Vec<WindowBody>,
}

/// One window inside an availability document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowBody {
    /// ISO `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM`.
    #[serde(default)]
    pub start_time: String,
    /// `HH:MM`; older documents may lack it.
    #[serde(default)]
    pub end_time: Option<String>,
}

impl AvailabilityBody {
    /// Gather one participant's rows into a document body.
    pub fn from_rows(
        participant_id: String,
        group_tag: Option<String>,
        rows: Vec<AvailabilityEntity>,
    ) -> Self {
        Self {
            participant_id,
            group_tag,
            windows: rows
                .into_iter()
                .map(|row| WindowBody {
                    date: row.date,
                    start_time: row.start_time,
                    end_time: row.end_time,
                })
                .collect(),
        }
    }

    /// Flatten back into availability rows.
    pub fn into_rows(self) -> Vec<AvailabilityEntity> {
        let Self {
            participant_id,
            group_tag,
            windows,
        } = self;
        windows
            .into_iter()
            .map(|window| AvailabilityEntity {
                participant_id: participant_id.clone(),
                date: window.date,
                start_time: window.start_time,
                end_time: window.end_time,
                group_tag: group_tag.clone(),
            })
            .collect()
    }

    /// Drop windows dated before `date`, returning how many were removed.
    pub fn prune_before(&mut self, date: &str) -> usize {
        let before = self.windows.len();
        self.windows.retain(|window| window.date.as_str() >= date);
        before - self.windows.len()
    }
}

/// Document id of a participant's availability partition.
pub fn availability_doc_id(participant_id: &str) -> String {
    format!("{AVAILABILITY_PREFIX}{participant_id}")
}

/// Document id of a fixture.
pub fn fixture_doc_id(fixture_id: &str) -> String {
    format!("{FIXTURE_PREFIX}{fixture_id}")
}

/// Stored fixture document.
pub type FixtureDocument = CouchDocument<FixtureEntity>;
/// Stored availability partition document.
pub type AvailabilityDocument = CouchDocument<AvailabilityBody>;
