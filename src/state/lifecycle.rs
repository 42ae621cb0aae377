//! Fixture lifecycle:
//!
//! ```text
//! PENDING   --confirm(date, time)--> SCHEDULED
//! SCHEDULED --edit(date, time)-----> SCHEDULED
//! SCHEDULED --cancel---------------> PENDING
//! SCHEDULED --mark played----------> PLAYED
//! PENDING   --close----------------> CLOSED
//! ```
//!
//! `PLAYED` and `CLOSED` are terminal.

use thiserror::Error;

use crate::state::league::{Fixture, FixtureState, Schedule};

/// Events that can be applied to a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureEvent {
    /// Players agree on a date and start time.
    Confirm(Schedule),
    /// Players move an agreed booking.
    Edit(Schedule),
    /// Players drop an agreed booking.
    Cancel,
    /// The agreed date has passed.
    MarkPlayed,
    /// Manual closure without playing.
    Close,
}

impl FixtureEvent {
    /// Short name used in logs and error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            FixtureEvent::Confirm(_) => "confirm",
            FixtureEvent::Edit(_) => "edit",
            FixtureEvent::Cancel => "cancel",
            FixtureEvent::MarkPlayed => "mark_played",
            FixtureEvent::Close => "close",
        }
    }
}

/// Error returned when an event cannot be applied from the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {} cannot be applied while {from}", .event.name())]
pub struct InvalidTransition {
    /// State the fixture was in when the event was received.
    pub from: FixtureState,
    /// Event that cannot be applied from this state.
    pub event: FixtureEvent,
}

impl FixtureState {
    /// Compute the state reached by applying `event`, if the transition is valid.
    pub fn next(self, event: FixtureEvent) -> Result<FixtureState, InvalidTransition> {
        let next = match (self, event) {
            (FixtureState::Pending, FixtureEvent::Confirm(_)) => FixtureState::Scheduled,
            (FixtureState::Scheduled, FixtureEvent::Edit(_)) => FixtureState::Scheduled,
            (FixtureState::Scheduled, FixtureEvent::Cancel) => FixtureState::Pending,
            (FixtureState::Scheduled, FixtureEvent::MarkPlayed) => FixtureState::Played,
            (FixtureState::Pending, FixtureEvent::Close) => FixtureState::Closed,
            (from, event) => return Err(InvalidTransition { from, event }),
        };
        Ok(next)
    }
}

impl Fixture {
    /// Apply an event, updating state and schedule together. Returns the previous state.
    pub fn apply(&mut self, event: FixtureEvent) -> Result<FixtureState, InvalidTransition> {
        let previous = self.state;
        let next = previous.next(event)?;

        match event {
            FixtureEvent::Confirm(schedule) | FixtureEvent::Edit(schedule) => {
                self.schedule = Some(schedule);
            }
            FixtureEvent::Cancel => self.schedule = None,
            FixtureEvent::MarkPlayed | FixtureEvent::Close => {}
        }
        self.state = next;

        Ok(previous)
    }
}
