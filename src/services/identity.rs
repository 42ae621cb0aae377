//! Presentation helpers: display names, fixture titles and pairing strings.

use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;

use crate::state::league::{Fixture, FixtureId, ParticipantId};

static ROUND_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"J(\d+)").expect("round pattern is a valid regex"));

/// Shown in place of an unfilled player slot.
pub const EMPTY_SLOT: &str = "...";

/// Display name for `id`, or the raw id when the participant is unknown.
pub fn resolve_name<'a>(names: &'a HashMap<ParticipantId, String>, id: &'a ParticipantId) -> &'a str {
    names.get(id).map(String::as_str).unwrap_or(id.as_str())
}

/// Human title of a fixture: `Round n` when its id carries a `J<n>` token.
pub fn derive_title(fixture_id: &FixtureId) -> String {
    match ROUND_PATTERN.captures(fixture_id.as_str()) {
        Some(captures) => format!("Round {}", &captures[1]),
        None => fixture_id.to_string(),
    }
}

/// `A/B vs C/D` line-up of a fixture.
pub fn format_pairing(fixture: &Fixture, names: &HashMap<ParticipantId, String>) -> String {
    let [a, b, c, d] = fixture
        .slots
        .each_ref()
        .map(|slot| slot.as_ref().map_or(EMPTY_SLOT, |id| resolve_name(names, id)));
    format!("{a}/{b} vs {c}/{d}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::league::FixtureState;

    fn names() -> HashMap<ParticipantId, String> {
        HashMap::from([
            ("P1".into(), "Ana".to_string()),
            ("P2".into(), "Bea".to_string()),
            ("P3".into(), "Carla".to_string()),
        ])
    }

    #[test]
    fn titles_come_from_the_round_token() {
        assert_eq!(derive_title(&"P-M2-J4-01".into()), "Round 4");
        assert_eq!(derive_title(&"P-01-J12".into()), "Round 12");
        assert_eq!(derive_title(&"FRIENDLY-7".into()), "FRIENDLY-7");
    }

    #[test]
    fn unknown_ids_fall_back_to_themselves() {
        let names = names();
        let unknown = ParticipantId::from("ZZ01");
        assert_eq!(resolve_name(&names, &"P1".into()), "Ana");
        assert_eq!(resolve_name(&names, &unknown), "ZZ01");
    }

    #[test]
    fn pairing_marks_unfilled_slots() {
        let fixture = Fixture {
            id: "P-01-J1".into(),
            group_tag: "LEVEL-A".into(),
            slots: [Some("P1".into()), Some("P2".into()), Some("P3".into()), None],
            schedule: None,
            state: FixtureState::Pending,
        };
        assert_eq!(format_pairing(&fixture, &names()), "Ana/Bea vs Carla/...");
    }
}
