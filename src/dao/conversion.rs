//! Normalization between store records and domain types.
//!
//! Reads never fail on a sparse or dirty row: missing optional fields get a
//! default, and rows that cannot be made valid are dropped with a warning.

use tracing::warn;

use crate::{
    dao::models::{
        AvailabilityEntity, FixtureEntity, FixtureUpdate, ParticipantEntity,
    },
    state::{
        calendar::{MinuteOfDay, format_date, parse_date, to_minutes, to_minutes_or_zero},
        league::{
            AvailabilityWindow, FIXTURE_SIZE, Fixture, FixtureState, GroupTag, Participant,
            ParticipantId, Schedule,
        },
    },
};

fn group_tag_or_default(tag: Option<&str>) -> GroupTag {
    tag.map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(GroupTag::from)
        .unwrap_or_else(GroupTag::unassigned)
}

impl From<&ParticipantEntity> for Participant {
    fn from(entity: &ParticipantEntity) -> Self {
        let display_name = entity
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&entity.id)
            .to_string();

        Participant {
            id: ParticipantId::from(entity.id.trim()),
            display_name,
            group_tag: group_tag_or_default(entity.group_tag.as_deref()),
        }
    }
}

/// Normalize an availability row. A missing end time defaults to `grid_end`.
pub fn window_from_entity(
    entity: &AvailabilityEntity,
    grid_end: MinuteOfDay,
) -> Option<AvailabilityWindow> {
    let participant_id = entity.participant_id.trim();
    if participant_id.is_empty() {
        warn!(date = %entity.date, "dropping availability row without participant id");
        return None;
    }

    let date = match parse_date(&entity.date) {
        Ok(date) => date,
        Err(err) => {
            warn!(participant_id, error = %err, "dropping availability row with invalid date");
            return None;
        }
    };

    let start = to_minutes_or_zero(&entity.start_time);
    let end = match entity.end_time.as_deref().map(str::trim) {
        Some(end) if !end.is_empty() => to_minutes_or_zero(end),
        _ => grid_end,
    };

    match AvailabilityWindow::new(participant_id.into(), date, start, end) {
        Ok(window) => Some(window),
        Err(err) => {
            warn!(participant_id, error = %err, "dropping empty availability window");
            None
        }
    }
}

/// Render a window as an availability row.
pub fn window_to_entity(window: &AvailabilityWindow, group_tag: &GroupTag) -> AvailabilityEntity {
    AvailabilityEntity {
        participant_id: window.participant_id().to_string(),
        date: format_date(window.date()),
        start_time: window.start().to_string(),
        end_time: Some(window.end().to_string()),
        group_tag: (!group_tag.is_unassigned()).then(|| group_tag.to_string()),
    }
}

/// Normalize a fixture row. Rows with an unknown state token are dropped.
pub fn fixture_from_entity(entity: &FixtureEntity) -> Option<Fixture> {
    let fixture_id = entity.fixture_id.trim();
    if fixture_id.is_empty() {
        warn!("dropping fixture row without id");
        return None;
    }

    let state = match entity.state.as_deref().map(str::trim) {
        None | Some("") => FixtureState::Pending,
        Some(token) => match token.parse::<FixtureState>() {
            Ok(state) => state,
            Err(err) => {
                warn!(fixture_id, error = %err, "dropping fixture row");
                return None;
            }
        },
    };

    if entity.player_ids.len() > FIXTURE_SIZE {
        warn!(
            fixture_id,
            count = entity.player_ids.len(),
            "fixture lists more than four players; extra ids ignored"
        );
    }
    let mut slots: [Option<ParticipantId>; FIXTURE_SIZE] = Default::default();
    for (slot, raw) in slots.iter_mut().zip(entity.player_ids.iter()) {
        let raw = raw.trim();
        if !raw.is_empty() {
            *slot = Some(ParticipantId::from(raw));
        }
    }

    Some(Fixture {
        id: fixture_id.into(),
        group_tag: group_tag_or_default(entity.group_tag.as_deref()),
        slots,
        schedule: schedule_from_fields(
            fixture_id,
            entity.scheduled_date.as_deref(),
            entity.scheduled_time.as_deref(),
        ),
        state,
    })
}

fn schedule_from_fields(
    fixture_id: &str,
    date: Option<&str>,
    time: Option<&str>,
) -> Option<Schedule> {
    let date = date.map(str::trim).filter(|date| !date.is_empty())?;
    let date = match parse_date(date) {
        Ok(date) => date,
        Err(err) => {
            warn!(fixture_id, error = %err, "ignoring unreadable fixture schedule");
            return None;
        }
    };
    let start = time
        .map(str::trim)
        .filter(|time| !time.is_empty())
        .and_then(|time| to_minutes(time).ok())
        .unwrap_or(MinuteOfDay::MIDNIGHT);

    Some(Schedule { date, start })
}

/// Build the guarded update that moves a stored fixture from `expected` to the
/// state and schedule currently held by `fixture`.
pub fn fixture_update(fixture: &Fixture, expected: FixtureState) -> FixtureUpdate {
    FixtureUpdate {
        fixture_id: fixture.id.to_string(),
        expected_state: expected.as_token().to_string(),
        state: fixture.state.as_token().to_string(),
        scheduled_date: fixture.schedule.map(|s| format_date(s.date)),
        scheduled_time: fixture.schedule.map(|s| s.start.to_string()),
    }
}
