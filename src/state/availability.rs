use std::collections::{BTreeMap, HashMap};

use time::Date;
use tracing::debug;

use crate::state::{
    calendar::MinuteOfDay,
    league::{AvailabilityWindow, ParticipantId},
};

/// Availability keyed by `(participant, date)`, built once per matching query.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityIndex {
    by_participant: HashMap<ParticipantId, BTreeMap<Date, (MinuteOfDay, MinuteOfDay)>>,
}

impl AvailabilityIndex {
    /// Index the given windows. A later window for the same participant and date replaces an earlier one.
    pub fn from_windows<'a>(windows: impl IntoIterator<Item = &'a AvailabilityWindow>) -> Self {
        let mut index = Self::default();
        for window in windows {
            let dates = index
                .by_participant
                .entry(window.participant_id().clone())
                .or_default();
            if dates
                .insert(window.date(), (window.start(), window.end()))
                .is_some()
            {
                debug!(
                    participant_id = %window.participant_id(),
                    date = %window.date(),
                    "duplicate availability window; keeping the last one"
                );
            }
        }
        index
    }

    /// Window of `participant` on `date`, as `(start, end)`.
    pub fn window(&self, participant: &ParticipantId, date: Date) -> Option<(MinuteOfDay, MinuteOfDay)> {
        self.by_participant.get(participant)?.get(&date).copied()
    }

    /// Dates with a window for `participant`, in ascending order.
    pub fn dates(&self, participant: &ParticipantId) -> impl Iterator<Item = Date> + '_ {
        self.by_participant
            .get(participant)
            .into_iter()
            .flat_map(|dates| dates.keys().copied())
    }

    /// Whether no window is indexed.
    pub fn is_empty(&self) -> bool {
        self.by_participant.is_empty()
    }
}
