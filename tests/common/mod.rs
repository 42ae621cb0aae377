#![allow(dead_code)]

use std::sync::Arc;

use padel_league_back::{
    config::AppConfig,
    dao::{
        league_store::memory::{MemoryLeagueStore, MemoryTables},
        models::{AssignmentEntity, AvailabilityEntity, FixtureEntity, ParticipantEntity},
    },
    state::{AppState, SharedState, clock::FixedClock},
};
use time::{Date, macros::date};

pub const TODAY: Date = date!(2026 - 02 - 10);

fn participant(id: &str, name: &str, group: Option<&str>) -> ParticipantEntity {
    ParticipantEntity {
        id: id.into(),
        display_name: Some(name.into()),
        group_tag: group.map(Into::into),
        credential: Some(format!("{}-secret", id.to_lowercase())),
    }
}

fn window(participant_id: &str, date: &str, start: &str, end: &str) -> AvailabilityEntity {
    AvailabilityEntity {
        participant_id: participant_id.into(),
        date: date.into(),
        start_time: start.into(),
        end_time: Some(end.into()),
        group_tag: Some("LEVEL-A".into()),
    }
}

fn fixture(id: &str, players: &[&str], schedule: Option<(&str, &str)>, state: &str) -> FixtureEntity {
    FixtureEntity {
        fixture_id: id.into(),
        group_tag: Some("LEVEL-A".into()),
        player_ids: players.iter().map(|id| id.to_string()).collect(),
        scheduled_date: schedule.map(|(date, _)| date.into()),
        scheduled_time: schedule.map(|(_, time)| time.into()),
        state: Some(state.into()),
    }
}

/// Four players of LEVEL-A overlapping for exactly an hour on 2026-02-12,
/// a fifth player whose group only comes from the assignments table.
pub fn league_tables() -> MemoryTables {
    MemoryTables {
        participants: vec![
            participant("P1", "Ana", Some("LEVEL-A")),
            participant("P2", "Bea", Some("LEVEL-A")),
            participant("P3", "Carla", Some("LEVEL-A")),
            participant("P4", "Dani", Some("LEVEL-A")),
            participant("P5", "Eva", None),
        ],
        assignments: vec![AssignmentEntity {
            id: "AS-1".into(),
            group_tag: Some("LEVEL-B".into()),
            participant_id: "P5".into(),
        }],
        availability: vec![
            window("P1", "2026-02-12", "18:00", "21:00"),
            window("P2", "2026-02-12", "18:30", "20:00"),
            window("P3", "2026-02-12", "17:00", "20:30"),
            window("P4", "2026-02-12", "18:00", "19:30"),
            window("P1", "2026-02-13", "10:00", "14:00"),
            window("P2", "2026-02-13", "10:00", "14:00"),
            window("P3", "2026-02-13", "10:00", "14:00"),
        ],
        fixtures: vec![
            fixture("A-01-J1", &["P1", "P2", "P3", "P4"], None, "PENDING"),
            fixture(
                "A-02-J2",
                &["P1", "P3", "P2", "P4"],
                Some(("2026-02-05", "19:00")),
                "SCHEDULED",
            ),
            fixture("A-03-J3", &["P1", "P4", "", "P2"], None, "PENDING"),
            fixture(
                "A-04-J4",
                &["P1", "P4", "P2", "P3"],
                Some(("2026-02-20", "18:00")),
                "SCHEDULED",
            ),
        ],
    }
}

/// Application state frozen on [`TODAY`] with the league tables installed.
pub async fn seeded_state() -> (SharedState, MemoryLeagueStore) {
    let store = MemoryLeagueStore::with_tables(league_tables());
    let state = AppState::with_clock(AppConfig::default(), Arc::new(FixedClock(TODAY)));
    state.install_league_store(Arc::new(store.clone())).await;
    (state, store)
}
