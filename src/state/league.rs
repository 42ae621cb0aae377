use std::{borrow::Borrow, fmt, str::FromStr};

use thiserror::Error;
use time::Date;

use crate::state::calendar::MinuteOfDay;

/// Number of players a fixture is played with.
pub const FIXTURE_SIZE: usize = 4;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Stable identifier of a league participant.
    ParticipantId
);
string_id!(
    /// Identifier of a fixture, following the seeding convention (e.g. `P-03-J4`).
    FixtureId
);
string_id!(
    /// Scoping label (skill tier) partitioning participants and fixtures.
    GroupTag
);

impl GroupTag {
    /// Tag substituted when a record carries none.
    pub fn unassigned() -> Self {
        Self(String::new())
    }

    /// Whether this is the substituted empty tag.
    pub fn is_unassigned(&self) -> bool {
        self.0.is_empty()
    }
}

/// Registered participant as seen by the core (read-only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Participant id.
    pub id: ParticipantId,
    /// Name shown to other players.
    pub display_name: String,
    /// Group, possibly unassigned.
    pub group_tag: GroupTag,
}

/// Rejected window bounds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("window on {date} must start before it ends ({start}..{end})")]
pub struct InvalidWindow {
    /// Date of the window.
    pub date: Date,
    /// Submitted start.
    pub start: MinuteOfDay,
    /// Submitted end.
    pub end: MinuteOfDay,
}

/// A participant's single contiguous availability interval on one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityWindow {
    participant_id: ParticipantId,
    date: Date,
    start: MinuteOfDay,
    end: MinuteOfDay,
}

impl AvailabilityWindow {
    /// Build a window, enforcing `start < end`.
    pub fn new(
        participant_id: ParticipantId,
        date: Date,
        start: MinuteOfDay,
        end: MinuteOfDay,
    ) -> Result<Self, InvalidWindow> {
        if start >= end {
            return Err(InvalidWindow { date, start, end });
        }
        Ok(Self {
            participant_id,
            date,
            start,
            end,
        })
    }

    /// Owner.
    pub fn participant_id(&self) -> &ParticipantId {
        &self.participant_id
    }

    /// Calendar date.
    pub fn date(&self) -> Date {
        self.date
    }

    /// First available minute.
    pub fn start(&self) -> MinuteOfDay {
        self.start
    }

    /// Minute availability ends.
    pub fn end(&self) -> MinuteOfDay {
        self.end
    }

    /// Length of the window in minutes.
    pub fn duration_minutes(&self) -> u16 {
        self.end.get() - self.start.get()
    }
}

/// Agreed date and start time of a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    /// Agreed date.
    pub date: Date,
    /// Agreed start time.
    pub start: MinuteOfDay,
}

/// Lifecycle state of a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixtureState {
    /// Players assigned, no date agreed yet.
    Pending,
    /// Date and time agreed.
    Scheduled,
    /// Scheduled date has passed.
    Played,
    /// Closed by hand (legacy path).
    Closed,
}

impl FixtureState {
    /// Literal token used by the store.
    pub const fn as_token(self) -> &'static str {
        match self {
            FixtureState::Pending => "PENDING",
            FixtureState::Scheduled => "SCHEDULED",
            FixtureState::Played => "PLAYED",
            FixtureState::Closed => "CLOSED",
        }
    }

    /// No transition leaves a terminal state.
    pub const fn is_terminal(self) -> bool {
        matches!(self, FixtureState::Played | FixtureState::Closed)
    }
}

impl fmt::Display for FixtureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Unknown fixture state token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown fixture state `{0}`")]
pub struct UnknownState(pub String);

impl FromStr for FixtureState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "PENDING" => Ok(FixtureState::Pending),
            "SCHEDULED" => Ok(FixtureState::Scheduled),
            "PLAYED" => Ok(FixtureState::Played),
            "CLOSED" => Ok(FixtureState::Closed),
            other => Err(UnknownState(other.to_string())),
        }
    }
}

/// A four-player match and its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    /// Fixture id.
    pub id: FixtureId,
    /// Group the fixture belongs to.
    pub group_tag: GroupTag,
    /// Player slots in pairing order: slots 0/1 play slots 2/3.
    pub slots: [Option<ParticipantId>; FIXTURE_SIZE],
    /// Agreed date and time, when scheduled.
    pub schedule: Option<Schedule>,
    /// Lifecycle state.
    pub state: FixtureState,
}

impl Fixture {
    /// All four players, or `None` while any slot is unfilled.
    pub fn lineup(&self) -> Option<[&ParticipantId; FIXTURE_SIZE]> {
        let [a, b, c, d] = &self.slots;
        Some([a.as_ref()?, b.as_ref()?, c.as_ref()?, d.as_ref()?])
    }

    /// Whether every slot has a player.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Whether the participant plays in this fixture.
    pub fn includes(&self, participant_id: &ParticipantId) -> bool {
        self.slots
            .iter()
            .flatten()
            .any(|slot| slot == participant_id)
    }
}

/// Derived, never persisted: a date on which all four players overlap long enough.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCandidate {
    /// Fixture the candidate is for.
    pub fixture_id: FixtureId,
    /// Candidate date.
    pub date: Date,
    /// Latest start among the four players.
    pub common_start: MinuteOfDay,
    /// Earliest end among the four players.
    pub common_end: MinuteOfDay,
}

impl MatchCandidate {
    /// Length of the common window in minutes.
    pub fn overlap_minutes(&self) -> u16 {
        self.common_end.get().saturating_sub(self.common_start.get())
    }
}

/// A participant's fixtures bucketed by lifecycle state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantFixtures {
    /// Awaiting a date.
    pub pending: Vec<Fixture>,
    /// Date agreed.
    pub scheduled: Vec<Fixture>,
    /// Played.
    pub played: Vec<Fixture>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn minute(h: u16, m: u16) -> MinuteOfDay {
        MinuteOfDay::from_hm(h, m).unwrap()
    }

    fn fixture(slots: [Option<&str>; 4]) -> Fixture {
        Fixture {
            id: "P-01-J1".into(),
            group_tag: "LEVEL-A".into(),
            slots: slots.map(|slot| slot.map(ParticipantId::from)),
            schedule: None,
            state: FixtureState::Pending,
        }
    }

    #[test]
    fn window_requires_start_before_end() {
        let id = ParticipantId::from("P1");
        assert!(
            AvailabilityWindow::new(id.clone(), date!(2026 - 02 - 10), minute(17, 0), minute(17, 0))
                .is_err()
        );
        assert!(
            AvailabilityWindow::new(id.clone(), date!(2026 - 02 - 10), minute(19, 0), minute(17, 0))
                .is_err()
        );
        let window =
            AvailabilityWindow::new(id, date!(2026 - 02 - 10), minute(17, 0), minute(21, 0))
                .unwrap();
        assert_eq!(window.duration_minutes(), 240);
    }

    #[test]
    fn state_tokens_round_trip() {
        for state in [
            FixtureState::Pending,
            FixtureState::Scheduled,
            FixtureState::Played,
            FixtureState::Closed,
        ] {
            assert_eq!(state.as_token().parse::<FixtureState>().unwrap(), state);
        }
        assert!("PROGRAMADO".parse::<FixtureState>().is_err());
    }

    #[test]
    fn lineup_requires_all_slots() {
        let full = fixture([Some("A"), Some("B"), Some("C"), Some("D")]);
        assert!(full.is_complete());
        assert_eq!(full.lineup().unwrap()[2].as_str(), "C");

        let partial = fixture([Some("A"), None, Some("C"), Some("D")]);
        assert!(!partial.is_complete());
        assert!(partial.lineup().is_none());
        assert!(partial.includes(&"C".into()));
        assert!(!partial.includes(&"B".into()));
    }
}
