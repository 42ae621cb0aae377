//! Overlap matching: which dates suit all four players of a pending fixture.
//!
//! Everything here is pure. Callers load fixtures and build the
//! [`AvailabilityIndex`] once per query, then hand both in.

use std::collections::BTreeSet;

use time::Date;

use crate::state::{
    availability::AvailabilityIndex,
    calendar::MinuteOfDay,
    league::{Fixture, FixtureState, MatchCandidate},
};

/// Default shortest common window worth proposing, in minutes.
pub const DEFAULT_MIN_OVERLAP_MINUTES: u16 = 60;

/// A pending fixture and every date its players could meet on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureCandidates {
    /// The matched fixture.
    pub fixture: Fixture,
    /// Qualifying dates in ascending order.
    pub candidates: Vec<MatchCandidate>,
}

/// Intersection of the given `(start, end)` windows.
///
/// `None` when there are no windows or when they do not overlap at all.
pub fn common_window(
    windows: impl IntoIterator<Item = (MinuteOfDay, MinuteOfDay)>,
) -> Option<(MinuteOfDay, MinuteOfDay)> {
    let mut windows = windows.into_iter();
    let first = windows.next()?;
    let (start, end) = windows.fold(first, |(start, end), (s, e)| (start.max(s), end.min(e)));
    (start < end).then_some((start, end))
}

/// Candidate dates for one fixture, or an empty list when it cannot be matched.
pub fn candidates_for_fixture(
    fixture: &Fixture,
    index: &AvailabilityIndex,
    today: Date,
    min_overlap_minutes: u16,
) -> Vec<MatchCandidate> {
    if fixture.state != FixtureState::Pending {
        return Vec::new();
    }
    let Some(lineup) = fixture.lineup() else {
        return Vec::new();
    };

    let dates: BTreeSet<Date> = lineup
        .iter()
        .flat_map(|player| index.dates(player))
        .filter(|date| *date >= today)
        .collect();

    dates
        .into_iter()
        .filter_map(|date| {
            let windows: Option<Vec<_>> = lineup
                .iter()
                .map(|player| index.window(player, date))
                .collect();
            let (common_start, common_end) = common_window(windows?)?;
            let candidate = MatchCandidate {
                fixture_id: fixture.id.clone(),
                date,
                common_start,
                common_end,
            };
            (candidate.overlap_minutes() >= min_overlap_minutes).then_some(candidate)
        })
        .collect()
}

/// Candidates of every pending, fully staffed fixture that has at least one.
pub fn find_candidates<'a>(
    fixtures: impl IntoIterator<Item = &'a Fixture>,
    index: &AvailabilityIndex,
    today: Date,
    min_overlap_minutes: u16,
) -> Vec<FixtureCandidates> {
    fixtures
        .into_iter()
        .filter_map(|fixture| {
            let candidates = candidates_for_fixture(fixture, index, today, min_overlap_minutes);
            (!candidates.is_empty()).then(|| FixtureCandidates {
                fixture: fixture.clone(),
                candidates,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::league::{AvailabilityWindow, ParticipantId};
    use time::macros::date;

    const TODAY: Date = date!(2026 - 02 - 09);

    fn t(value: &str) -> MinuteOfDay {
        value.parse().unwrap()
    }

    fn window(participant: &str, date: Date, start: &str, end: &str) -> AvailabilityWindow {
        AvailabilityWindow::new(participant.into(), date, t(start), t(end)).unwrap()
    }

    fn fixture(id: &str, players: [Option<&str>; 4]) -> Fixture {
        Fixture {
            id: id.into(),
            group_tag: "LEVEL-A".into(),
            slots: players.map(|p| p.map(ParticipantId::from)),
            schedule: None,
            state: FixtureState::Pending,
        }
    }

    fn full_fixture() -> Fixture {
        fixture("F1", [Some("P1"), Some("P2"), Some("P3"), Some("P4")])
    }

    fn scenario_windows() -> Vec<AvailabilityWindow> {
        let day = date!(2026 - 02 - 10);
        vec![
            window("P1", day, "17:00", "21:00"),
            window("P2", day, "17:00", "21:00"),
            window("P3", day, "17:00", "19:30"),
            window("P4", day, "17:00", "21:00"),
        ]
    }

    #[test]
    fn common_window_is_latest_start_to_earliest_end() {
        assert_eq!(
            common_window([(t("17:00"), t("21:00")), (t("18:30"), t("20:00"))]),
            Some((t("18:30"), t("20:00")))
        );
        // Disjoint windows never yield a negative duration.
        assert_eq!(
            common_window([(t("10:00"), t("12:00")), (t("13:00"), t("15:00"))]),
            None
        );
        assert_eq!(common_window(std::iter::empty()), None);
    }

    #[test]
    fn four_players_overlapping_yield_one_candidate() {
        let index = AvailabilityIndex::from_windows(&scenario_windows());
        let found = find_candidates([&full_fixture()], &index, TODAY, 60);

        assert_eq!(found.len(), 1);
        let candidate = &found[0].candidates[0];
        assert_eq!(candidate.date, date!(2026 - 02 - 10));
        assert_eq!(candidate.common_start, t("17:00"));
        assert_eq!(candidate.common_end, t("19:30"));
        assert_eq!(candidate.overlap_minutes(), 150);
    }

    #[test]
    fn missing_player_window_drops_the_date() {
        let windows: Vec<_> = scenario_windows()
            .into_iter()
            .filter(|w| w.participant_id().as_str() != "P4")
            .collect();
        let index = AvailabilityIndex::from_windows(&windows);
        assert!(candidates_for_fixture(&full_fixture(), &index, TODAY, 60).is_empty());
        assert!(find_candidates([&full_fixture()], &index, TODAY, 60).is_empty());
    }

    #[test]
    fn incomplete_fixture_is_never_a_candidate() {
        let index = AvailabilityIndex::from_windows(&scenario_windows());
        let partial = fixture("F2", [Some("P1"), Some("P2"), None, Some("P4")]);
        assert!(candidates_for_fixture(&partial, &index, TODAY, 0).is_empty());
    }

    #[test]
    fn only_pending_fixtures_are_matched() {
        let index = AvailabilityIndex::from_windows(&scenario_windows());
        let mut scheduled = full_fixture();
        scheduled.state = FixtureState::Scheduled;
        assert!(candidates_for_fixture(&scheduled, &index, TODAY, 60).is_empty());
    }

    #[test]
    fn threshold_and_past_dates_filter_candidates() {
        let index = AvailabilityIndex::from_windows(&scenario_windows());
        assert!(candidates_for_fixture(&full_fixture(), &index, TODAY, 151).is_empty());
        assert_eq!(candidates_for_fixture(&full_fixture(), &index, TODAY, 150).len(), 1);
        assert!(
            candidates_for_fixture(&full_fixture(), &index, date!(2026 - 02 - 11), 60).is_empty()
        );
        // Today itself still counts.
        assert_eq!(
            candidates_for_fixture(&full_fixture(), &index, date!(2026 - 02 - 10), 60).len(),
            1
        );
    }

    #[test]
    fn every_qualifying_date_is_listed_in_order() {
        let mut windows = scenario_windows();
        let later = date!(2026 - 02 - 12);
        for player in ["P1", "P2", "P3", "P4"] {
            windows.push(window(player, later, "10:00", "11:30"));
        }
        // Too short on the 11th.
        let short = date!(2026 - 02 - 11);
        for player in ["P1", "P2", "P3", "P4"] {
            windows.push(window(player, short, "10:00", "10:30"));
        }
        let index = AvailabilityIndex::from_windows(&windows);

        let dates: Vec<_> = candidates_for_fixture(&full_fixture(), &index, TODAY, 60)
            .into_iter()
            .map(|c| c.date)
            .collect();
        assert_eq!(dates, vec![date!(2026 - 02 - 10), later]);
    }
}
