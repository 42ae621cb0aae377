mod common;

use padel_league_back::{
    dto::{
        availability::{ReplaceAvailabilityRequest, WindowDto},
        fixture::ScheduleRequest,
        participant::LoginRequest,
    },
    error::ServiceError,
    services::{
        availability_service, fixture_service,
        fixture_service::FixtureAction,
        participant_service,
    },
    state::league::{FixtureId, GroupTag, ParticipantId},
};

use common::seeded_state;

fn window(date: &str, start: &str, end: &str) -> WindowDto {
    WindowDto {
        date: date.into(),
        start_time: start.into(),
        end_time: end.into(),
    }
}

#[tokio::test]
async fn login_requires_the_exact_credential() {
    let (state, _) = seeded_state().await;

    let accepted = participant_service::authenticate(
        &state,
        &LoginRequest {
            participant_id: "P1".into(),
            credential: "p1-secret".into(),
        },
    )
    .await
    .unwrap();
    assert_eq!(accepted.display_name, "Ana");
    assert_eq!(accepted.group_tag, "LEVEL-A");

    for (id, credential) in [("P1", "P1-SECRET"), ("P1", "p1-secret "), ("P9", "p9-secret")] {
        let rejected = participant_service::authenticate(
            &state,
            &LoginRequest {
                participant_id: id.into(),
                credential: credential.into(),
            },
        )
        .await;
        assert!(matches!(rejected, Err(ServiceError::Unauthorized(_))), "{id}/{credential}");
    }
}

#[tokio::test]
async fn group_falls_back_to_assignments() {
    let (state, _) = seeded_state().await;
    let info = participant_service::participant_info(&state, &ParticipantId::from("P5"))
        .await
        .unwrap();
    assert_eq!(info.group_tag, "LEVEL-B");
    assert_eq!(info.display_name, "Eva");
}

#[tokio::test]
async fn group_candidates_only_list_complete_pending_fixtures_with_overlap() {
    let (state, _) = seeded_state().await;

    let found = fixture_service::candidates_for_group(&state, &GroupTag::from("LEVEL-A"))
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    let entry = &found[0];
    assert_eq!(entry.fixture_id, "A-01-J1");
    assert_eq!(entry.title, "Round 1");
    assert_eq!(entry.pairing, "Ana/Bea vs Carla/Dani");
    assert_eq!(entry.candidates.len(), 1);
    assert_eq!(entry.candidates[0].date, "2026-02-12");
    assert_eq!(entry.candidates[0].start_time, "18:30");
    assert_eq!(entry.candidates[0].end_time, "19:30");
    assert_eq!(entry.candidates[0].overlap_minutes, 60);
}

#[tokio::test]
async fn shrinking_one_window_removes_the_candidate() {
    let (state, _) = seeded_state().await;
    let p4 = ParticipantId::from("P4");

    availability_service::replace_windows(
        &state,
        &p4,
        &ReplaceAvailabilityRequest {
            windows: vec![window("2026-02-12", "18:00", "19:00")],
        },
    )
    .await
    .unwrap();

    let found = fixture_service::candidates_for_participant(&state, &ParticipantId::from("P1"))
        .await
        .unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn replacing_windows_leaves_other_participants_alone() {
    let (state, _) = seeded_state().await;

    let stored = availability_service::replace_windows(
        &state,
        &ParticipantId::from("P1"),
        &ReplaceAvailabilityRequest {
            windows: vec![
                window("2026-02-15", "09:00", "11:00"),
                window("2026-02-11", "20:00", "22:30"),
            ],
        },
    )
    .await
    .unwrap();
    let dates: Vec<_> = stored.windows.iter().map(|w| w.date.as_str()).collect();
    assert_eq!(dates, ["2026-02-11", "2026-02-15"]);

    let p2 = availability_service::get_windows(&state, &ParticipantId::from("P2"))
        .await
        .unwrap();
    assert_eq!(p2.windows.len(), 2);
}

#[tokio::test]
async fn invalid_submissions_are_rejected_before_writing() {
    let (state, store) = seeded_state().await;
    let p1 = ParticipantId::from("P1");
    let before = availability_service::get_windows(&state, &p1).await.unwrap();
    let calls = store.call_count();

    for windows in [
        vec![window("2026-02-09", "18:00", "20:00")],
        vec![window("2026-02-12", "18:15", "20:00")],
        vec![window("2026-02-12", "20:00", "18:00")],
        vec![
            window("2026-02-12", "18:00", "20:00"),
            window("2026-02-12", "09:00", "10:00"),
        ],
    ] {
        let result = availability_service::replace_windows(
            &state,
            &p1,
            &ReplaceAvailabilityRequest { windows },
        )
        .await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }

    assert_eq!(store.call_count(), calls);
    let after = availability_service::get_windows(&state, &p1).await.unwrap();
    assert_eq!(after.windows, before.windows);
}

#[tokio::test]
async fn participant_fixtures_advance_past_due_matches_first() {
    let (state, _) = seeded_state().await;

    let fixtures =
        fixture_service::fixtures_for_participant(&state, &ParticipantId::from("P1"))
            .await
            .unwrap();

    let ids = |bucket: &[padel_league_back::dto::fixture::FixtureResponse]| {
        bucket.iter().map(|f| f.id.clone()).collect::<Vec<_>>()
    };
    assert_eq!(ids(&fixtures.pending), ["A-01-J1", "A-03-J3"]);
    assert_eq!(ids(&fixtures.scheduled), ["A-04-J4"]);
    assert_eq!(ids(&fixtures.played), ["A-02-J2"]);
    assert_eq!(fixtures.pending[1].pairing, "Ana/Dani vs .../Bea");

    let again = fixture_service::advance_past_due(&state, &GroupTag::from("LEVEL-A"))
        .await
        .unwrap();
    assert_eq!(again.advanced, 0);
}

#[tokio::test]
async fn lifecycle_actions_follow_the_state_machine() {
    let (state, _) = seeded_state().await;
    let id = FixtureId::from("A-01-J1");
    let schedule = ScheduleRequest {
        date: "2026-02-12".into(),
        time: "18:30".into(),
    };

    let confirmed =
        fixture_service::apply_action(&state, &id, FixtureAction::Confirm, Some(&schedule))
            .await
            .unwrap();
    assert_eq!(confirmed.state, "SCHEDULED");
    assert_eq!(confirmed.scheduled_time.as_deref(), Some("18:30"));

    let twice =
        fixture_service::apply_action(&state, &id, FixtureAction::Confirm, Some(&schedule)).await;
    assert!(matches!(twice, Err(ServiceError::InvalidState(_))));

    let moved = fixture_service::apply_action(
        &state,
        &id,
        FixtureAction::Edit,
        Some(&ScheduleRequest {
            date: "2026-02-13".into(),
            time: "10:00".into(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(moved.scheduled_date.as_deref(), Some("2026-02-13"));

    let cancelled = fixture_service::apply_action(&state, &id, FixtureAction::Cancel, None)
        .await
        .unwrap();
    assert_eq!(cancelled.state, "PENDING");
    assert!(cancelled.scheduled_date.is_none());

    let group = GroupTag::from("LEVEL-A");
    let candidates = fixture_service::candidates_for_group(&state, &group)
        .await
        .unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].fixture_id, "A-01-J1");
    assert_eq!(candidates[0].candidates[0].date, "2026-02-12");
    assert_eq!(candidates[0].candidates[0].start_time, "18:30");
    assert_eq!(candidates[0].candidates[0].end_time, "19:30");

    let missing_schedule =
        fixture_service::apply_action(&state, &id, FixtureAction::Confirm, None).await;
    assert!(matches!(missing_schedule, Err(ServiceError::InvalidInput(_))));

    let unknown = fixture_service::apply_action(
        &state,
        &FixtureId::from("Z-99-J9"),
        FixtureAction::Cancel,
        None,
    )
    .await;
    assert!(matches!(unknown, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn degraded_state_rejects_every_operation() {
    let (state, _) = seeded_state().await;
    state.clear_league_store().await;

    let result =
        participant_service::participant_info(&state, &ParticipantId::from("P1")).await;
    assert!(matches!(result, Err(ServiceError::Degraded)));
}
