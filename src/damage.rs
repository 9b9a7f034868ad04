//! Damage resolution.
//!
//! The damage index is a pure function of character and tool state. The
//! order of operations is fixed and must not be reassociated:
//! base, then character-or-default multiplier, then group-synergy doubling.

use crate::model::{CharacterRecord, ToolRecord};

/// Damage contributed per roll-count point.
const BASE_PER_COUNT: f64 = 10.0;

/// Practice bonus added to a tool's character multiplier on a raid win.
pub const MULTIPLIER_INCREMENT: f64 = 0.05;

/// Practice bonus under hard mode.
pub const MULTIPLIER_INCREMENT_HARD: f64 = 0.10;

/// Practice bonus under nightmare mode.
pub const MULTIPLIER_INCREMENT_NIGHTMARE: f64 = 0.20;

/// Compute a hand's damage index.
///
/// `character_name` is the case-folded name used to look up the tool's
/// character-specific multiplier. A hand with no tool deals base damage.
pub fn damage_index(
    character_name: &str,
    character: &CharacterRecord,
    tool: Option<&ToolRecord>,
) -> f64 {
    let base = character.count as f64 * BASE_PER_COUNT;

    let Some(tool) = tool else {
        return base;
    };

    let multiplier = tool
        .character_multipliers
        .get(character_name)
        .copied()
        .unwrap_or(tool.default_multiplier);
    let mut damage = base * multiplier;

    if tool.group == character.group {
        damage *= 2.0;
    }

    damage
}

/// Practice-bonus increment for the active difficulty.
pub fn multiplier_increment(hard_mode: bool, nightmare: bool) -> f64 {
    if nightmare {
        MULTIPLIER_INCREMENT_NIGHTMARE
    } else if hard_mode {
        MULTIPLIER_INCREMENT_HARD
    } else {
        MULTIPLIER_INCREMENT
    }
}

/// Bump a tool's character-specific multiplier after a won raid.
///
/// An existing entry grows by `increment`; a missing one is seeded at
/// `default_multiplier + increment`. Entries never decrease.
pub fn apply_practice_bonus(tool: &mut ToolRecord, character_name: &str, increment: f64) {
    tool.character_multipliers
        .entry(character_name.to_string())
        .and_modify(|multiplier| *multiplier += increment)
        .or_insert(tool.default_multiplier + increment);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UNSORTED_GROUP;

    fn character(count: u64, group: &str) -> CharacterRecord {
        CharacterRecord {
            count,
            group: group.to_string(),
            ..Default::default()
        }
    }

    fn tool(default_multiplier: f64, group: &str) -> ToolRecord {
        ToolRecord {
            default_multiplier,
            group: group.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_no_tool_deals_base() {
        let c = character(5, UNSORTED_GROUP);
        assert_eq!(damage_index("gorb", &c, None), 50.0);
    }

    #[test]
    fn test_default_multiplier_applied() {
        let c = character(5, UNSORTED_GROUP);
        let t = tool(1.5, "None");
        assert_eq!(damage_index("gorb", &c, Some(&t)), 75.0);
    }

    #[test]
    fn test_character_multiplier_overrides_default() {
        let c = character(4, UNSORTED_GROUP);
        let mut t = tool(1.5, "None");
        t.character_multipliers.insert("gorb".to_string(), 2.0);

        assert_eq!(damage_index("gorb", &c, Some(&t)), 80.0);
        // Other characters still get the default.
        assert_eq!(damage_index("dave", &c, Some(&t)), 60.0);
    }

    #[test]
    fn test_specific_entry_equal_to_default_matches_default_branch() {
        let c = character(7, UNSORTED_GROUP);
        let plain = tool(1.5, "None");
        let mut seeded = tool(1.5, "None");
        seeded.character_multipliers.insert("gorb".to_string(), 1.5);

        assert_eq!(
            damage_index("gorb", &c, Some(&plain)),
            damage_index("gorb", &c, Some(&seeded))
        );
    }

    #[test]
    fn test_group_synergy_doubles_after_multiplier() {
        let c = character(3, "warriors");
        let t = tool(2.0, "warriors");
        // 3*10 * 2.0, then doubled.
        assert_eq!(damage_index("gorb", &c, Some(&t)), 120.0);
    }

    #[test]
    fn test_unsorted_groups_still_synergize_when_equal() {
        // Synergy is a plain equality check on the group tags.
        let c = character(1, UNSORTED_GROUP);
        let mut t = tool(1.0, "None");
        assert_eq!(damage_index("gorb", &c, Some(&t)), 10.0);
        t.group = UNSORTED_GROUP.to_string();
        assert_eq!(damage_index("gorb", &c, Some(&t)), 20.0);
    }

    #[test]
    fn test_increment_by_difficulty() {
        assert_eq!(multiplier_increment(false, false), 0.05);
        assert_eq!(multiplier_increment(true, false), 0.10);
        assert_eq!(multiplier_increment(true, true), 0.20);
        assert_eq!(multiplier_increment(false, true), 0.20);
    }

    #[test]
    fn test_practice_bonus_seeds_then_accrues() {
        let mut t = tool(1.5, "None");

        apply_practice_bonus(&mut t, "gorb", 0.05);
        assert_eq!(t.character_multipliers["gorb"], 1.55);

        apply_practice_bonus(&mut t, "gorb", 0.10);
        assert!((t.character_multipliers["gorb"] - 1.65).abs() < 1e-9);
    }
}
