use serde::{Deserialize, Serialize};

use crate::dao::models::AvailabilityEntity;

/// Every availability window of one participant, keyed by participant id so
/// that a replace is a single-document upsert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MongoAvailabilityDocument {
    /// Owner of the partition, used as `_id`.
    #[serde(rename = "_id")]
    pub participant_id: String,
    /// Group of the owner at write time.
    #[serde(default)]
    pub group_tag: Option<String>,
    /// Windows sorted by date.
    #[serde(default)]
    pub windows: Vec<MongoWindow>,
}

/// One window inside an availability document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MongoWindow {
    /// ISO `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM`.
    #[serde(default)]
    pub start_time: String,
    /// `HH:MM`; older documents may lack it.
    #[serde(default)]
    pub end_time: Option<String>,
}

impl MongoAvailabilityDocument {
    /// Gather one participant's rows into a document.
    pub fn new(
        participant_id: String,
        group_tag: Option<String>,
        rows: Vec<AvailabilityEntity>,
    ) -> Self {
        Self {
            participant_id,
            group_tag,
            windows: rows
                .into_iter()
                .map(|row| MongoWindow {
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

    /// Windows that a prune before `date` would remove.
    pub fn stale_before(&self, date: &str) -> usize {
        self.windows
            .iter()
            .filter(|window| window.date.as_str() < date)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_inherit_owner_and_group() {
        let doc = MongoAvailabilityDocument {
            participant_id: "P1".into(),
            group_tag: Some("LEVEL-B".into()),
            windows: vec![
                MongoWindow {
                    date: "2026-02-09".into(),
                    start_time: "18:00".into(),
                    end_time: Some("20:00".into()),
                },
                MongoWindow {
                    date: "2026-02-11".into(),
                    start_time: "10:00".into(),
                    end_time: None,
                },
            ],
        };
        assert_eq!(doc.stale_before("2026-02-10"), 1);

        let rows = doc.into_rows();
        assert!(rows.iter().all(|row| row.participant_id == "P1"));
        assert!(rows.iter().all(|row| row.group_tag.as_deref() == Some("LEVEL-B")));
    }
}
