//! Statistics queries and rollups over the store.
//!
//! Leaderboard queries are tie-aware: they return every name holding the
//! maximum, so a two-way tie reports both holders.

use crate::model::{ServerRecord, UserRecord};
use crate::store::{StatsStore, StoreError};

/// Narration tier for a roll-count increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollTier {
    Normal,
    /// The rolled character now holds the count lead outright.
    TookLead,
    /// The rolled character tied the count lead.
    TiedLead,
    /// The rolled character is the first to reach 100 rolls.
    Milestone,
}

/// Server campaign progress summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignProgress {
    pub campaign: String,
    pub completed: u64,
}

fn leaders<'a, I>(entries: I) -> (Vec<String>, u64)
where
    I: Iterator<Item = (&'a String, u64)>,
{
    let mut max = 0;
    let mut names = Vec::new();

    for (name, value) in entries {
        if value > max {
            max = value;
            names.clear();
            names.push(name.clone());
        } else if value == max && value > 0 {
            names.push(name.clone());
        }
    }

    names.sort();
    (names, max)
}

/// The most commonly rolled character(s) and their count.
///
/// Ties return every holder of the maximum; an empty store returns
/// `(vec![], 0)`.
pub fn most_common_character(store: &StatsStore) -> (Vec<String>, u64) {
    leaders(store.characters.iter().map(|(name, c)| (name, c.count)))
}

/// The character(s) with the most raid wins.
pub fn winningest_raider(store: &StatsStore) -> (Vec<String>, u64) {
    leaders(store.characters.iter().map(|(name, c)| (name, c.raids_won)))
}

/// The user(s) with the most PVP wins.
pub fn pvp_champion(store: &StatsStore) -> (Vec<String>, u64) {
    leaders(store.users.iter().map(|(name, u)| (name, u.pvp_wins)))
}

/// All characters sorted into a group, in name order.
pub fn group_members(store: &StatsStore, group: &str) -> Vec<String> {
    let mut members: Vec<String> = store
        .characters
        .iter()
        .filter(|(_, c)| c.group == group)
        .map(|(name, _)| name.clone())
        .collect();
    members.sort();
    members
}

/// A server's campaign pointer and completed-cycle count.
pub fn campaign_progress(store: &StatsStore, server: &str) -> CampaignProgress {
    match store.server(server) {
        Some(record) => CampaignProgress {
            campaign: record.campaign.clone(),
            completed: record.campaign_completed,
        },
        None => CampaignProgress {
            campaign: crate::model::CAMPAIGN_NONE.to_string(),
            completed: 0,
        },
    }
}

/// Increment a character's roll count and classify the result.
///
/// The tier compares against the pre-increment maximum, so the current
/// leader keeps "taking the lead" on every roll. The first character to
/// reach 100 rolls gets the milestone tier instead.
pub async fn increment_character_count(
    store: &mut StatsStore,
    name: &str,
) -> Result<RollTier, StoreError> {
    let (_, max_before) = most_common_character(store);

    let record = store.character_mut(name);
    record.count += 1;
    let new_count = record.count;
    store.save_all().await?;

    let tier = if new_count == 100 && max_before < 100 {
        RollTier::Milestone
    } else if new_count > max_before {
        RollTier::TookLead
    } else if new_count == max_before {
        RollTier::TiedLead
    } else {
        RollTier::Normal
    };
    Ok(tier)
}

/// Fold one raid's damage into a user's lifetime stats.
///
/// Recomputes the running average and tracks the personal best.
pub fn record_raid_damage(user: &mut UserRecord, damage: f64) {
    if damage <= 0.0 {
        return;
    }
    user.total_damage += damage;
    user.total_raids += 1;
    user.average_damage = user.total_damage / user.total_raids as f64;
    if damage > user.highest_damage {
        user.highest_damage = damage;
    }
}

/// Fold one raid's total damage into a server's aggregate stats.
pub fn record_server_damage(server: &mut ServerRecord, damage: f64) {
    server.total_damage += damage;
    if damage > server.highest_damage {
        server.highest_damage = damage;
    }
}
