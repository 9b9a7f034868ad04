//! Persisted record types for the five stat collections.
//!
//! Every record is a flat, serde-friendly struct keyed by name. All fields
//! carry `#[serde(default)]` so that records written by older builds load
//! cleanly, and unknown fields in the files are silently dropped.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Group tag for characters that have not been sorted yet.
pub const UNSORTED_GROUP: &str = "_unsorted";

/// Name of the sentinel boss guarding the end of the campaign.
pub const DEATH_BOSS: &str = "death";

/// Campaign pointer value marking a finished campaign cycle.
pub const CAMPAIGN_COMPLETE: &str = "COMPLETE";

/// Campaign pointer value for a server that has never raided.
pub const CAMPAIGN_NONE: &str = "None";

/// The fixed set of character/tool groups used for synergy matching.
pub const CHARACTER_GROUPS: &[&str] = &[
    "alex",
    "alex call center",
    "alex drag strip",
    "alex garage",
    "alex scholars",
    "alex shamans",
    "alexcon",
    "ALEXFORCE",
    "china expansion",
    "classics",
    "classics family",
    "drip havers",
    "duos",
    "evil geniuses",
    "experiment",
    "geekers",
    "hamburger",
    "hooligans",
    "intuitive eaters",
    "magic cards",
    "magic entities",
    "majhong club",
    "middle east",
    "money getters",
    "negative morale",
    "non human",
    "non living",
    "oldheads",
    "poopbutt industries",
    "prisoners",
    "quans",
    "racing team",
    "rec center",
    "retirement home",
    "shapeshifter",
    "shawties",
    "shop class",
    "space war",
    "squads",
    "tater dynasty",
    "the arcane",
    "the cookout",
    "truck month",
    "warriors",
    "yurt kitchen",
    "yurt trucking",
    "yurttears",
    UNSORTED_GROUP,
];

/// Check whether a group tag belongs to the fixed enumeration.
pub fn is_valid_group(group: &str) -> bool {
    CHARACTER_GROUPS.contains(&group)
}

fn default_unsorted() -> String {
    UNSORTED_GROUP.to_string()
}

fn default_none() -> String {
    "None".to_string()
}

fn default_multiplier() -> f64 {
    1.0
}

/// Raid mode selected at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaidMode {
    /// Deterministic progression through the boss sequence.
    Campaign,
    /// A random previously-encountered boss.
    Classic,
}

impl fmt::Display for RaidMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaidMode::Campaign => write!(f, "campaign"),
            RaidMode::Classic => write!(f, "classic"),
        }
    }
}

impl FromStr for RaidMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "campaign" => Ok(RaidMode::Campaign),
            "classic" => Ok(RaidMode::Classic),
            other => Err(format!("unknown raid mode: {other}")),
        }
    }
}

/// Lifetime statistics for one rollable character.
///
/// Identity is the case-folded character name. Created lazily on first
/// reference, never deleted. `count` only ever increases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterRecord {
    /// How many times this character has been rolled.
    pub count: u64,
    /// Synergy group tag, one of [`CHARACTER_GROUPS`].
    pub group: String,
    pub raids_won: u64,
    pub raids_completed: u64,
    pub favorite_weapon: String,
    pub total_pvp: u64,
    pub pvp_wins: u64,
    /// Carried over from the 1.0 data migration.
    pub is_1_0: bool,
}

impl Default for CharacterRecord {
    fn default() -> Self {
        Self {
            count: 0,
            group: default_unsorted(),
            raids_won: 0,
            raids_completed: 0,
            favorite_weapon: default_none(),
            total_pvp: 0,
            pvp_wins: 0,
            is_1_0: false,
        }
    }
}

/// Stats and configuration for one raid boss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossRecord {
    /// Baseline health before campaign and difficulty scaling.
    pub health: f64,
    /// Matched against a character's group, the character name itself,
    /// or the drawn tool name.
    pub weakness: String,
    pub times_defeated: u64,
    pub times_won: u64,
    /// Narration shown when the boss wakes at raid start.
    pub wake_message: String,
    /// Next campaign pointer once this boss falls, or "COMPLETE".
    pub campaign_id: Option<String>,
}

impl Default for BossRecord {
    fn default() -> Self {
        Self {
            health: 0.0,
            weakness: String::new(),
            times_defeated: 0,
            times_won: 0,
            wake_message: String::new(),
            campaign_id: None,
        }
    }
}

/// Stats for one drawable tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolRecord {
    /// Baseline damage scalar applied when no character-specific entry exists.
    pub default_multiplier: f64,
    /// Synergy group tag, "None" when the tool has no group.
    pub group: String,
    /// Sparse per-character multipliers, seeded the first time a character
    /// wins a raid holding this tool. Entries only ever increase.
    pub character_multipliers: HashMap<String, f64>,
}

impl Default for ToolRecord {
    fn default() -> Self {
        Self {
            default_multiplier: default_multiplier(),
            group: default_none(),
            character_multipliers: HashMap::new(),
        }
    }
}

/// Lifetime statistics for one platform user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserRecord {
    pub total_rolls: u64,
    pub highest_damage: f64,
    /// Derived: `total_damage / total_raids`, recomputed on every
    /// raid-damage update.
    pub average_damage: f64,
    pub total_damage: f64,
    pub total_raids: u64,
    pub raid_wins: u64,
    /// Owned rare cards in unlock order. Duplicates allowed.
    pub deck: Vec<String>,
    pub tolls: u64,
    pub total_pvp: u64,
    pub pvp_wins: u64,
    pub cursed: bool,
}

impl Default for UserRecord {
    fn default() -> Self {
        Self {
            total_rolls: 0,
            highest_damage: 0.0,
            average_damage: 0.0,
            total_damage: 0.0,
            total_raids: 0,
            raid_wins: 0,
            deck: Vec::new(),
            tolls: 0,
            total_pvp: 0,
            pvp_wins: 0,
            cursed: false,
        }
    }
}

/// Guild-scoped aggregate statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerRecord {
    /// Advisory mutex: true while a raid session is live on this server.
    /// Forcibly reset to false on every store load.
    pub active_raid: bool,
    pub total_rolls: u64,
    /// Current campaign pointer: a boss name, "None", "COMPLETE", or "death".
    pub campaign: String,
    /// How many full campaign cycles this server has finished.
    pub campaign_completed: u64,
    pub users: u64,
    pub ex_cards: u64,
    pub raid_wins: u64,
    pub total_raids: u64,
    pub total_damage: f64,
    pub highest_damage: f64,
    pub total_pvp: u64,
}

impl Default for ServerRecord {
    fn default() -> Self {
        Self {
            active_raid: false,
            total_rolls: 0,
            campaign: default_none(),
            campaign_completed: 0,
            users: 0,
            ex_cards: 0,
            raid_wins: 0,
            total_raids: 0,
            total_damage: 0.0,
            highest_damage: 0.0,
            total_pvp: 0,
        }
    }
}

/// One participant's drawn character + tool + computed damage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hand {
    /// Case-folded character name.
    pub character: String,
    /// Tool name; absent for bonus sub-draws that roll characters only.
    pub tool: Option<String>,
    /// Fractional damage index. Rounded only at display/accumulation time.
    pub damage: f64,
}
