//! Records exchanged with the store, one per logical table.
//!
//! Fields the store may omit are `Option` (or defaulted) so that a sparse row
//! never fails a whole read; normalization into domain types happens in
//! [`crate::dao::conversion`].

use serde::{Deserialize, Serialize};

/// Row of the Users table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantEntity {
    /// Stable participant identifier.
    pub id: String,
    /// Human readable name shown to other players.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Group (level) the participant plays in.
    #[serde(default)]
    pub group_tag: Option<String>,
    /// Login credential as stored by the seeding process.
    #[serde(default)]
    pub credential: Option<String>,
}

/// Row of the Assignments table: which group a participant belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssignmentEntity {
    /// Row identifier.
    pub id: String,
    /// Assigned group.
    #[serde(default)]
    pub group_tag: Option<String>,
    /// Participant the assignment is for.
    pub participant_id: String,
}

/// Row of the Availability table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilityEntity {
    /// Owner of the window.
    pub participant_id: String,
    /// ISO `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM`, 24-hour.
    #[serde(default)]
    pub start_time: String,
    /// `HH:MM`, 24-hour. Older rows may lack it.
    #[serde(default)]
    pub end_time: Option<String>,
    /// Group of the owner at write time.
    #[serde(default)]
    pub group_tag: Option<String>,
}

/// Row of the Fixtures table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FixtureEntity {
    /// Natural fixture id, e.g. `A-01-J1`.
    pub fixture_id: String,
    /// Group the fixture belongs to.
    #[serde(default)]
    pub group_tag: Option<String>,
    /// Up to four participant ids in pairing order; blank entries are unfilled slots.
    #[serde(default)]
    pub player_ids: Vec<String>,
    /// Agreed date, ISO `YYYY-MM-DD`.
    #[serde(default)]
    pub scheduled_date: Option<String>,
    /// Agreed start, `HH:MM`.
    #[serde(default)]
    pub scheduled_time: Option<String>,
    /// Lifecycle token (`PENDING`, `SCHEDULED`, `PLAYED`, `CLOSED`).
    #[serde(default)]
    pub state: Option<String>,
}

/// Token assumed for fixture rows without a state.
pub const PENDING_TOKEN: &str = "PENDING";

impl FixtureEntity {
    /// Stored lifecycle token, trimmed; rows with a missing or blank state are pending.
    pub fn state_token(&self) -> &str {
        match self.state.as_deref().map(str::trim) {
            None | Some("") => PENDING_TOKEN,
            Some(token) => token,
        }
    }
}

/// Targeted update of a fixture's lifecycle fields, applied only if the
/// stored state still equals `expected_state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureUpdate {
    /// Fixture to update.
    pub fixture_id: String,
    /// Token the stored state must still hold.
    pub expected_state: String,
    /// New state token.
    pub state: String,
    /// New date, or `None` to clear it.
    pub scheduled_date: Option<String>,
    /// New start time, or `None` to clear it.
    pub scheduled_time: Option<String>,
}

/// Result of a guarded fixture update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The update was written.
    Applied,
    /// No fixture has the given id.
    NotFound,
    /// The stored state differed from the expected one; nothing was written.
    Conflict {
        /// State token found in the store.
        actual: String,
    },
}
