//! Gateway-facing command flows.
//!
//! Each function here is the engine side of one chat command: it rolls and
//! mutates through the store, then hands back typed payloads (plus ready
//! narration text where the flow has a canonical line) for the gateway to
//! render. Nothing in this module talks to a chat platform.

use crate::assets::{AssetCategory, AssetRepository, ImageRef};
use crate::config::GameConfig;
use crate::messages;
use crate::model::{is_valid_group, UNSORTED_GROUP};
use crate::roll::RollError;
use crate::stats::{self, CampaignProgress, RollTier};
use crate::store::{StatsStore, StoreError};
use rand::Rng;
use thiserror::Error;

/// Rolling this character curses the roller.
pub const CURSE_CHARACTER: &str = "the unholy trinity";

/// Rolling this character lifts the curse.
pub const BLESS_CHARACTER: &str = "the holy trinity";

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("'{0}' is not a known group")]
    UnknownGroup(String),

    #[error("'{0}' is not a known character")]
    UnknownCharacter(String),

    #[error("'{0}' already exists")]
    AlreadyExists(String),

    #[error("'{name}' is already sorted into {group}")]
    AlreadySorted { name: String, group: String },

    #[error(transparent)]
    Roll(#[from] RollError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A renderable line with an optional card image.
#[derive(Debug, Clone)]
pub struct Narration {
    pub text: String,
    pub image: Option<ImageRef>,
}

impl Narration {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }

    pub fn with_image(text: impl Into<String>, image: ImageRef) -> Self {
        Self {
            text: text.into(),
            image: Some(image),
        }
    }
}

/// The curse state change a roll caused, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurseEvent {
    Applied,
    Lifted,
}

/// What a single card roll produced.
#[derive(Debug, Clone)]
pub enum RollOutcome {
    Character {
        name: String,
        count: u64,
        tier: RollTier,
        curse: Option<CurseEvent>,
        /// Roller is cursed after this roll; the gateway renders accordingly.
        cursed: bool,
        narrations: Vec<Narration>,
    },
    ExCard {
        name: String,
        narrations: Vec<Narration>,
    },
}

/// Roll one card for `user`.
///
/// A rare card drops once per [`GameConfig::ex_card_odds`] rolls and goes
/// straight into the user's deck. Otherwise a character is drawn from the
/// full listing, unrevealed cards included, and its count advances.
pub async fn roll_card<A, R>(
    store: &mut StatsStore,
    assets: &A,
    config: &GameConfig,
    server_name: &str,
    user: &str,
    rng: &mut R,
) -> Result<RollOutcome, CommandError>
where
    A: AssetRepository,
    R: Rng,
{
    store.user_mut(user).total_rolls += 1;
    store.server_mut(server_name).total_rolls += 1;

    if rng.gen_range(0..config.ex_card_odds) == 0 {
        let listing = assets.list(AssetCategory::RareCards);
        if !listing.is_empty() {
            let name = listing[rng.gen_range(0..listing.len())].clone();
            store.user_mut(user).deck.push(name.clone());
            store.server_mut(server_name).ex_cards += 1;
            store.save_all().await.map_err(CommandError::from)?;
            let narrations = vec![Narration::with_image(
                messages::EX_CARD_UNLOCK,
                ImageRef::new(AssetCategory::RareCards, name.clone()),
            )];
            return Ok(RollOutcome::ExCard { name, narrations });
        }
        // Fall through to a normal roll when no rare cards are installed.
    }

    let listing = assets.list(AssetCategory::Characters);
    if listing.is_empty() {
        return Err(RollError::EmptyListing(AssetCategory::Characters).into());
    }
    let name = listing[rng.gen_range(0..listing.len())].to_lowercase();

    let curse = match name.as_str() {
        CURSE_CHARACTER => {
            store.user_mut(user).cursed = true;
            Some(CurseEvent::Applied)
        }
        BLESS_CHARACTER => {
            store.user_mut(user).cursed = false;
            Some(CurseEvent::Lifted)
        }
        _ => None,
    };

    // Persists every mutation this flow made.
    let tier = stats::increment_character_count(store, &name).await?;
    let count = store.character_mut(&name).count;
    let cursed = store.user_mut(user).cursed;

    let mut narrations = vec![Narration::with_image(
        name.clone(),
        ImageRef::new(AssetCategory::Characters, name.clone()),
    )];
    match tier {
        RollTier::TookLead => narrations.push(Narration::text(messages::stats_lead(&name))),
        RollTier::TiedLead => narrations.push(Narration::text(messages::stats_tie(&name))),
        RollTier::Milestone => narrations.push(Narration::text(messages::stats_milestone(&name))),
        RollTier::Normal => {}
    }
    match curse {
        Some(CurseEvent::Applied) => {
            narrations.push(Narration::text(messages::curse_applied(user)))
        }
        Some(CurseEvent::Lifted) => narrations.push(Narration::text(messages::curse_lifted(user))),
        None => {}
    }

    Ok(RollOutcome::Character {
        name,
        count,
        tier,
        curse,
        cursed,
        narrations,
    })
}

// ===========================================================================
// Read queries
// ===========================================================================

/// Everything the character-stats command displays.
#[derive(Debug, Clone)]
pub struct CharacterSummary {
    pub name: String,
    pub count: u64,
    pub group: String,
    pub raids_won: u64,
    pub raids_completed: u64,
    pub favorite_weapon: String,
    pub total_pvp: u64,
    pub pvp_wins: u64,
    pub image: ImageRef,
}

pub fn character_summary(store: &StatsStore, name: &str) -> Option<CharacterSummary> {
    let key = name.to_lowercase();
    let record = store.character(&key)?;
    Some(CharacterSummary {
        name: key.clone(),
        count: record.count,
        group: record.group.clone(),
        raids_won: record.raids_won,
        raids_completed: record.raids_completed,
        favorite_weapon: record.favorite_weapon.clone(),
        total_pvp: record.total_pvp,
        pvp_wins: record.pvp_wins,
        image: ImageRef::new(AssetCategory::Characters, key),
    })
}

/// Everything the user-stats command displays.
#[derive(Debug, Clone)]
pub struct UserSummary {
    pub name: String,
    pub total_rolls: u64,
    pub highest_damage: f64,
    pub average_damage: f64,
    pub total_raids: u64,
    pub raid_wins: u64,
    pub total_pvp: u64,
    pub pvp_wins: u64,
    pub deck_size: usize,
    pub cursed: bool,
}

pub fn user_summary(store: &StatsStore, name: &str) -> Option<UserSummary> {
    let key = name.to_lowercase();
    let record = store.user(&key)?;
    Some(UserSummary {
        name: key,
        total_rolls: record.total_rolls,
        highest_damage: record.highest_damage,
        average_damage: record.average_damage,
        total_raids: record.total_raids,
        raid_wins: record.raid_wins,
        total_pvp: record.total_pvp,
        pvp_wins: record.pvp_wins,
        deck_size: record.deck.len(),
        cursed: record.cursed,
    })
}

/// Everything the server-stats command displays.
#[derive(Debug, Clone)]
pub struct ServerSummary {
    pub name: String,
    pub total_rolls: u64,
    pub total_raids: u64,
    pub raid_wins: u64,
    pub total_damage: f64,
    pub highest_damage: f64,
    pub total_pvp: u64,
    pub ex_cards: u64,
    pub campaign: CampaignProgress,
}

pub fn server_summary(store: &StatsStore, name: &str) -> Option<ServerSummary> {
    let record = store.server(name)?;
    Some(ServerSummary {
        name: name.to_string(),
        total_rolls: record.total_rolls,
        total_raids: record.total_raids,
        raid_wins: record.raid_wins,
        total_damage: record.total_damage,
        highest_damage: record.highest_damage,
        total_pvp: record.total_pvp,
        ex_cards: record.ex_cards,
        campaign: stats::campaign_progress(store, name),
    })
}

/// A user's collected rare cards, in unlock order.
pub fn user_deck(store: &StatsStore, name: &str) -> Option<Vec<String>> {
    store.user(&name.to_lowercase()).map(|u| u.deck.clone())
}

// ===========================================================================
// Admin mutations
// ===========================================================================

/// Register a new character under a group.
pub async fn submit_character(
    store: &mut StatsStore,
    name: &str,
    group: &str,
) -> Result<(), CommandError> {
    if !is_valid_group(group) {
        return Err(CommandError::UnknownGroup(group.to_string()));
    }
    let key = name.to_lowercase();
    if store.character(&key).is_some() {
        return Err(CommandError::AlreadyExists(key));
    }
    store
        .update_character(&key, |record| record.group = group.to_string())
        .await?;
    Ok(())
}

/// Sort an unsorted character into a group.
///
/// Sorting is one-shot: a character already holding a real group is
/// rejected rather than re-sorted.
pub async fn update_group(
    store: &mut StatsStore,
    name: &str,
    group: &str,
) -> Result<(), CommandError> {
    if !is_valid_group(group) {
        return Err(CommandError::UnknownGroup(group.to_string()));
    }
    let key = name.to_lowercase();
    let record = match store.character(&key) {
        Some(record) => record,
        None => return Err(CommandError::UnknownCharacter(key)),
    };
    if record.group != UNSORTED_GROUP {
        return Err(CommandError::AlreadySorted {
            name: key,
            group: record.group.clone(),
        });
    }
    store
        .update_character(&key, |record| record.group = group.to_string())
        .await?;
    Ok(())
}

/// Register a new tool with its base multiplier, group affinity, and
/// optional pre-seeded character multipliers.
///
/// Tools with no group affinity use the ungrouped sentinel, which is a
/// valid group name here.
pub async fn submit_tool(
    store: &mut StatsStore,
    name: &str,
    default_multiplier: f64,
    group: &str,
    character_multipliers: &[(String, f64)],
) -> Result<(), CommandError> {
    if group != crate::model::CAMPAIGN_NONE && !is_valid_group(group) {
        return Err(CommandError::UnknownGroup(group.to_string()));
    }
    if store.tool(name).is_some() {
        return Err(CommandError::AlreadyExists(name.to_string()));
    }
    store
        .update_tool(name, |record| {
            record.default_multiplier = default_multiplier;
            record.group = group.to_string();
            for (character, multiplier) in character_multipliers {
                record
                    .character_multipliers
                    .insert(character.to_lowercase(), *multiplier);
            }
        })
        .await?;
    Ok(())
}

/// The troll's toll: increment the payer's lifetime toll counter.
pub async fn pay_toll(store: &mut StatsStore, user: &str) -> Result<Narration, CommandError> {
    store.update_user(user, |record| record.tolls += 1).await?;
    Ok(Narration::with_image(
        messages::TOLL_PAID,
        ImageRef::new(AssetCategory::Misc, "troll"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CharacterRecord;
    use crate::store::StorePaths;
    use crate::testing::{seeded_rng, MemoryAssets};
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> StatsStore {
        StatsStore::new(StorePaths::new(dir.path()))
    }

    #[tokio::test]
    async fn test_roll_advances_counts() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let assets = MemoryAssets::new().with_characters(["gorbo"]);
        // Odds high enough that the seeded draw never hits the rare branch.
        let config = GameConfig::default();
        let mut rng = seeded_rng(3);

        let outcome = roll_card(&mut store, &assets, &config, "guild", "Alice", &mut rng)
            .await
            .unwrap();

        match outcome {
            RollOutcome::Character { name, count, cursed, .. } => {
                assert_eq!(name, "gorbo");
                assert_eq!(count, 1);
                assert!(!cursed);
            }
            other => panic!("expected character roll, got {other:?}"),
        }
        assert_eq!(store.user_mut("alice").total_rolls, 1);
        assert_eq!(store.server_mut("guild").total_rolls, 1);
        assert_eq!(store.character_mut("gorbo").count, 1);
    }

    #[tokio::test]
    async fn test_guaranteed_ex_card() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let assets = MemoryAssets::new()
            .with_characters(["gorbo"])
            .with_rare_cards(["golden gorb"]);
        let config = GameConfig::default().with_ex_card_odds(1);
        let mut rng = seeded_rng(3);

        let outcome = roll_card(&mut store, &assets, &config, "guild", "alice", &mut rng)
            .await
            .unwrap();

        match outcome {
            RollOutcome::ExCard { name, .. } => assert_eq!(name, "golden gorb"),
            other => panic!("expected rare card, got {other:?}"),
        }
        assert_eq!(store.user_mut("alice").deck, vec!["golden gorb".to_string()]);
        assert_eq!(store.server_mut("guild").ex_cards, 1);
    }

    #[tokio::test]
    async fn test_curse_applied_and_lifted() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let config = GameConfig::default();

        let cursing = MemoryAssets::new().with_characters([CURSE_CHARACTER]);
        let mut rng = seeded_rng(9);
        let outcome = roll_card(&mut store, &cursing, &config, "guild", "alice", &mut rng)
            .await
            .unwrap();
        match outcome {
            RollOutcome::Character { curse, cursed, .. } => {
                assert_eq!(curse, Some(CurseEvent::Applied));
                assert!(cursed);
            }
            other => panic!("expected character roll, got {other:?}"),
        }

        let blessing = MemoryAssets::new().with_characters([BLESS_CHARACTER]);
        let outcome = roll_card(&mut store, &blessing, &config, "guild", "alice", &mut rng)
            .await
            .unwrap();
        match outcome {
            RollOutcome::Character { curse, cursed, .. } => {
                assert_eq!(curse, Some(CurseEvent::Lifted));
                assert!(!cursed);
            }
            other => panic!("expected character roll, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_milestone_narration_on_hundredth() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.characters.insert(
            "gorbo".to_string(),
            CharacterRecord {
                count: 99,
                ..CharacterRecord::default()
            },
        );
        let assets = MemoryAssets::new().with_characters(["gorbo"]);
        let mut rng = seeded_rng(3);

        let outcome = roll_card(
            &mut store,
            &assets,
            &GameConfig::default(),
            "guild",
            "alice",
            &mut rng,
        )
        .await
        .unwrap();

        match outcome {
            RollOutcome::Character { tier, narrations, .. } => {
                assert_eq!(tier, RollTier::Milestone);
                assert!(narrations
                    .iter()
                    .any(|n| n.text == messages::stats_milestone("gorbo")));
            }
            other => panic!("expected character roll, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submit_character_validates_group() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        assert!(matches!(
            submit_character(&mut store, "gorbo", "not a group").await,
            Err(CommandError::UnknownGroup(_))
        ));

        submit_character(&mut store, "Gorbo", "classics").await.unwrap();
        assert_eq!(store.character_mut("gorbo").group, "classics");

        assert!(matches!(
            submit_character(&mut store, "gorbo", "classics").await,
            Err(CommandError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_update_group_requires_existing_character() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        assert!(matches!(
            update_group(&mut store, "gorbo", "classics").await,
            Err(CommandError::UnknownCharacter(_))
        ));

        // Rolled characters start unsorted and can be sorted exactly once.
        store.character_mut("gorbo");
        update_group(&mut store, "gorbo", "warriors").await.unwrap();
        assert_eq!(store.character_mut("gorbo").group, "warriors");
    }

    #[tokio::test]
    async fn test_update_group_rejects_sorted_character() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        submit_character(&mut store, "gorbo", "classics").await.unwrap();
        match update_group(&mut store, "gorbo", "warriors").await {
            Err(CommandError::AlreadySorted { name, group }) => {
                assert_eq!(name, "gorbo");
                assert_eq!(group, "classics");
            }
            other => panic!("expected AlreadySorted, got {other:?}"),
        }
        assert_eq!(store.character_mut("gorbo").group, "classics");
    }

    #[tokio::test]
    async fn test_submit_tool() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        submit_tool(&mut store, "hammer", 1.5, "None", &[]).await.unwrap();
        let record = store.tool_mut("hammer");
        assert_eq!(record.default_multiplier, 1.5);
        assert_eq!(record.group, "None");
        assert!(record.character_multipliers.is_empty());

        assert!(matches!(
            submit_tool(&mut store, "hammer", 2.0, "None", &[]).await,
            Err(CommandError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_submit_tool_seeds_character_multipliers() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        let seeds = vec![("Gorbo".to_string(), 2.5), ("dave".to_string(), 0.5)];
        submit_tool(&mut store, "hammer", 1.5, "None", &seeds)
            .await
            .unwrap();

        let record = store.tool_mut("hammer");
        assert_eq!(record.character_multipliers["gorbo"], 2.5);
        assert_eq!(record.character_multipliers["dave"], 0.5);
    }

    #[tokio::test]
    async fn test_pay_toll_counts_up() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        let narration = pay_toll(&mut store, "Alice").await.unwrap();
        assert_eq!(narration.text, messages::TOLL_PAID);
        assert_eq!(
            narration.image,
            Some(ImageRef::new(AssetCategory::Misc, "troll"))
        );

        pay_toll(&mut store, "alice").await.unwrap();
        assert_eq!(store.user_mut("alice").tolls, 2);
    }
}
