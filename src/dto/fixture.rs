use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::validation::{validate_iso_date, validate_time_of_day},
    services::{
        identity::{derive_title, format_pairing},
        matching::FixtureCandidates,
    },
    state::{
        calendar::{format_date, parse_date, to_minutes},
        league::{Fixture, MatchCandidate, ParticipantFixtures, ParticipantId, Schedule},
    },
};

/// Date and start time agreed by the players.
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct ScheduleRequest {
    /// ISO `YYYY-MM-DD`.
    #[validate(custom(function = "validate_iso_date"))]
    pub date: String,
    /// `HH:MM`, 24-hour.
    #[validate(custom(function = "validate_time_of_day"))]
    pub time: String,
}

impl ScheduleRequest {
    /// Typed schedule. Expects a validated request.
    pub fn to_schedule(&self) -> Result<Schedule, String> {
        Ok(Schedule {
            date: parse_date(&self.date).map_err(|err| err.to_string())?,
            start: to_minutes(&self.time).map_err(|err| err.to_string())?,
        })
    }
}

/// A fixture with its presentation fields.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FixtureResponse {
    /// Fixture id.
    pub id: String,
    /// `Round n`, or the raw id.
    pub title: String,
    /// Group the fixture belongs to.
    pub group_tag: String,
    /// Player ids in pairing order; `null` for an unfilled slot.
    pub players: Vec<Option<String>>,
    /// `A/B vs C/D` with display names.
    pub pairing: String,
    /// Agreed date, when scheduled.
    pub scheduled_date: Option<String>,
    /// Agreed start time, when scheduled.
    pub scheduled_time: Option<String>,
    /// `PENDING`, `SCHEDULED`, `PLAYED` or `CLOSED`.
    pub state: String,
}

impl FixtureResponse {
    /// Presentation of `fixture`, names resolved through `names`.
    pub fn new(fixture: &Fixture, names: &HashMap<ParticipantId, String>) -> Self {
        Self {
            id: fixture.id.to_string(),
            title: derive_title(&fixture.id),
            group_tag: fixture.group_tag.to_string(),
            players: fixture
                .slots
                .iter()
                .map(|slot| slot.as_ref().map(ToString::to_string))
                .collect(),
            pairing: format_pairing(fixture, names),
            scheduled_date: fixture.schedule.map(|s| format_date(s.date)),
            scheduled_time: fixture.schedule.map(|s| s.start.to_string()),
            state: fixture.state.as_token().to_string(),
        }
    }
}

/// A participant's fixtures by lifecycle state.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ParticipantFixturesResponse {
    /// Awaiting a date.
    pub pending: Vec<FixtureResponse>,
    /// Date agreed, not played yet.
    pub scheduled: Vec<FixtureResponse>,
    /// Already played.
    pub played: Vec<FixtureResponse>,
}

impl ParticipantFixturesResponse {
    /// Presentation of every bucket.
    pub fn new(buckets: &ParticipantFixtures, names: &HashMap<ParticipantId, String>) -> Self {
        let render = |fixtures: &[Fixture]| -> Vec<FixtureResponse> {
            fixtures
                .iter()
                .map(|fixture| FixtureResponse::new(fixture, names))
                .collect()
        };
        Self {
            pending: render(&buckets.pending),
            scheduled: render(&buckets.scheduled),
            played: render(&buckets.played),
        }
    }
}

/// A date on which all four players overlap long enough.
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CandidateDto {
    /// ISO `YYYY-MM-DD`.
    pub date: String,
    /// Latest start among the four players.
    pub start_time: String,
    /// Earliest end among the four players.
    pub end_time: String,
    /// Length of the common window.
    pub overlap_minutes: u16,
}

impl From<&MatchCandidate> for CandidateDto {
    fn from(candidate: &MatchCandidate) -> Self {
        Self {
            date: format_date(candidate.date),
            start_time: candidate.common_start.to_string(),
            end_time: candidate.common_end.to_string(),
            overlap_minutes: candidate.overlap_minutes(),
        }
    }
}

/// A pending fixture and every date its players could meet on.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FixtureCandidatesResponse {
    /// Fixture id.
    pub fixture_id: String,
    /// `Round n`, or the raw id.
    pub title: String,
    /// `A/B vs C/D` with display names.
    pub pairing: String,
    /// Qualifying dates in ascending order.
    pub candidates: Vec<CandidateDto>,
}

impl FixtureCandidatesResponse {
    /// Presentation of an engine result.
    pub fn new(found: &FixtureCandidates, names: &HashMap<ParticipantId, String>) -> Self {
        Self {
            fixture_id: found.fixture.id.to_string(),
            title: derive_title(&found.fixture.id),
            pairing: format_pairing(&found.fixture, names),
            candidates: found.candidates.iter().map(CandidateDto::from).collect(),
        }
    }
}

/// Outcome of advancing a group's past-due fixtures.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdvanceResponse {
    /// Group that was advanced.
    pub group_tag: String,
    /// Fixtures moved to `PLAYED` by this call.
    pub advanced: usize,
}
