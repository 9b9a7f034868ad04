//! The raid session state machine.
//!
//! A raid moves through `Forming -> Drawing -> Resolving -> Outcome ->
//! Terminal`. The gateway drives the transitions: it opens the join window,
//! relays join requests, closes the window on host action or timeout, and
//! renders the events each phase returns. The per-server `active_raid` flag
//! is taken at start and released on every exit path, including errors: any
//! method returning `Err` has already released it and left the session
//! Terminal.

use crate::assets::{AssetCategory, AssetRepository, ImageRef};
use crate::config::GameConfig;
use crate::damage::{apply_practice_bonus, damage_index, multiplier_increment};
use crate::evolution::{check_evolution, Evolution};
use crate::model::{
    Hand, RaidMode, CAMPAIGN_COMPLETE, CAMPAIGN_NONE, DEATH_BOSS, UNSORTED_GROUP,
};
use crate::roll::{revealed, roll_boss_with_rng, roll_character_with_rng, roll_tool_with_rng, RollError};
use crate::stats::{record_raid_damage, record_server_damage};
use crate::store::{StatsStore, StoreError};
use rand::Rng;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// Tool that draws one additional full hand.
pub const BACKUP_TOOL: &str = "backup";

/// Tool that draws five additional characters, no tools.
pub const CONVOY_TOOL: &str = "convoy";

/// Tool that draws five additional characters from the wild group.
pub const CALL_OF_THE_WILD_TOOL: &str = "call of the wild";

/// Group the call-of-the-wild sub-draw is constrained to.
const WILD_GROUP: &str = "non human";

/// Terminal campaign boss whose defeat opens the death encounter.
pub const DEMISE_BOSS: &str = "KRYPTIS ZYPHER";

const SUB_DRAW_COUNT: usize = 5;

/// Errors from raid session operations.
#[derive(Debug, Error)]
pub enum RaidError {
    #[error("cannot start a raid while one is in progress")]
    InProgress,

    #[error("raid is in the {actual:?} phase, expected {expected:?}")]
    WrongPhase {
        expected: RaidPhase,
        actual: RaidPhase,
    },

    #[error(transparent)]
    Roll(#[from] RollError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Raid lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaidPhase {
    Forming,
    Drawing,
    Resolving,
    Outcome,
    Terminal,
}

/// Difficulty applied when the join window closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Normal,
    Hard,
    Nightmare,
}

/// Payload for the raid-start announcement.
#[derive(Debug, Clone)]
pub struct RaidAnnouncement {
    pub host: String,
    pub wake_message: String,
    pub mode_image: ImageRef,
}

/// One participant's drawn hand.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerHand {
    pub player: String,
    pub hand: Hand,
}

/// Result of the drawing phase.
#[derive(Debug, Clone)]
pub enum DrawResult {
    PlayerHands(Vec<PlayerHand>),
    EvolutionTriggered {
        evolution: Evolution,
        hands: Vec<PlayerHand>,
    },
}

/// A bonus character (and possibly tool) produced by a special tool.
#[derive(Debug, Clone, PartialEq)]
pub struct BonusDraw {
    pub character: String,
    pub tool: Option<String>,
    pub damage: f64,
}

/// One participant's fully resolved contribution.
#[derive(Debug, Clone)]
pub struct PlayerResolution {
    pub player: String,
    /// Hand with the final, special-effect-augmented damage.
    pub hand: Hand,
    pub bonus_draws: Vec<BonusDraw>,
    pub weakness_triggered: bool,
    /// The value folded into the session total.
    pub rounded_damage: f64,
}

/// Group-combo bonus detected across the party.
#[derive(Debug, Clone)]
pub struct GroupCombo {
    /// The duplicated groups, in contribution order.
    pub groups: Vec<String>,
    pub multiplier: u32,
}

/// Evolution bonus applied to the session total.
#[derive(Debug, Clone)]
pub struct EvolutionBonus {
    pub evolution: Evolution,
    pub multiplier: f64,
}

/// Everything that happened during the resolution phase.
#[derive(Debug, Clone)]
pub struct RaidResolution {
    pub players: Vec<PlayerResolution>,
    pub evolution_bonus: Option<EvolutionBonus>,
    pub group_combo: Option<GroupCombo>,
    pub total_damage: f64,
}

/// Final outcome of the raid.
#[derive(Debug, Clone)]
pub enum RaidOutcome {
    Victory {
        boss: String,
        damage: f64,
        /// The terminal campaign boss fell; the campaign now points at death.
        demise: bool,
        /// A campaign cycle completed and boss baselines were rescaled.
        new_cycle: bool,
    },
    Defeat {
        boss: String,
        remaining_health: f64,
    },
    /// Lost to the death boss; the gateway should open a death encounter.
    DeathDefeat,
}

/// A cooperative raid against one boss.
pub struct RaidSession {
    pub id: Uuid,
    mode: RaidMode,
    server: String,
    config: GameConfig,
    players: Vec<String>,
    boss: String,
    boss_health: f64,
    boss_weakness: String,
    hard_mode: bool,
    nightmare: bool,
    phase: RaidPhase,
    hands: Vec<PlayerHand>,
    evolution: Option<Evolution>,
    total_damage: f64,
}

impl RaidSession {
    /// Start a raid: take the server mutex, select the boss, and snapshot
    /// its campaign-scaled health.
    ///
    /// Fails with [`RaidError::InProgress`] if a raid is already live on
    /// this server, mutating nothing.
    pub async fn start<A, R>(
        store: &mut StatsStore,
        assets: &A,
        config: GameConfig,
        mode: RaidMode,
        server_name: &str,
        host: &str,
        rng: &mut R,
    ) -> Result<(Self, RaidAnnouncement), RaidError>
    where
        A: AssetRepository,
        R: Rng,
    {
        if store.server_mut(server_name).active_raid {
            return Err(RaidError::InProgress);
        }
        store
            .update_server(server_name, |server| server.active_raid = true)
            .await?;

        let boss = match roll_boss_with_rng(mode, server_name, store, assets, rng) {
            Ok(boss) => boss,
            Err(err) => {
                release_mutex(store, server_name).await?;
                return Err(err.into());
            }
        };

        let campaign_completed = store.server_mut(server_name).campaign_completed;
        let record = store.boss_mut(&boss).clone();
        let boss_health = record.health
            * (1.0 + config.campaign_health_scaling * campaign_completed as f64);

        // Persist the campaign-pointer side effect and any lazily created
        // boss record before the join window opens.
        if let Err(err) = store.save_all().await {
            release_mutex(store, server_name).await?;
            return Err(err.into());
        }

        let announcement = RaidAnnouncement {
            host: host.to_string(),
            wake_message: record.wake_message.clone(),
            mode_image: ImageRef::new(
                AssetCategory::Misc,
                match mode {
                    RaidMode::Campaign => "campaign",
                    RaidMode::Classic => "classic",
                },
            ),
        };

        let session = Self {
            id: Uuid::new_v4(),
            mode,
            server: server_name.to_string(),
            config,
            players: vec![host.to_string()],
            boss,
            boss_health,
            boss_weakness: record.weakness,
            hard_mode: false,
            nightmare: false,
            phase: RaidPhase::Forming,
            hands: Vec::new(),
            evolution: None,
            total_damage: 0.0,
        };
        Ok((session, announcement))
    }

    /// Add a participant during the join window.
    ///
    /// Idempotent: re-joining returns `Ok(false)` and changes nothing.
    pub fn join(&mut self, player: &str) -> Result<bool, RaidError> {
        self.expect_phase(RaidPhase::Forming)?;
        if self.players.iter().any(|p| p == player) {
            return Ok(false);
        }
        self.players.push(player.to_string());
        Ok(true)
    }

    /// Close the join window and apply participant-count difficulty.
    ///
    /// Nightmare takes precedence over hard mode; they never stack.
    pub fn close_join_window(&mut self) -> Result<Difficulty, RaidError> {
        self.expect_phase(RaidPhase::Forming)?;
        self.phase = RaidPhase::Drawing;

        let difficulty = if self.players.len() >= self.config.nightmare_threshold {
            self.boss_health *= self.config.nightmare_health;
            self.nightmare = true;
            Difficulty::Nightmare
        } else if self.players.len() >= self.config.hard_mode_threshold {
            self.boss_health *= self.config.hard_mode_health;
            self.hard_mode = true;
            Difficulty::Hard
        } else {
            Difficulty::Normal
        };
        Ok(difficulty)
    }

    /// Draw one hand per participant and run evolution detection over the
    /// drawn tools.
    pub async fn draw<A, R>(
        &mut self,
        store: &mut StatsStore,
        assets: &A,
        rng: &mut R,
    ) -> Result<DrawResult, RaidError>
    where
        A: AssetRepository,
        R: Rng,
    {
        self.expect_phase(RaidPhase::Drawing)?;

        let mut drawn_tools = Vec::with_capacity(self.players.len());
        for player in self.players.clone() {
            let hand = match self.draw_hand(store, assets, rng) {
                Ok(hand) => hand,
                Err(err) => {
                    self.terminate(store).await?;
                    return Err(err.into());
                }
            };
            if let Some(tool) = &hand.tool {
                drawn_tools.push(tool.clone());
            }
            self.hands.push(PlayerHand { player, hand });
        }

        self.evolution = check_evolution(&drawn_tools);
        self.phase = RaidPhase::Resolving;

        Ok(match &self.evolution {
            Some(evolution) => DrawResult::EvolutionTriggered {
                evolution: evolution.clone(),
                hands: self.hands.clone(),
            },
            None => DrawResult::PlayerHands(self.hands.clone()),
        })
    }

    fn draw_hand<A, R>(
        &self,
        store: &StatsStore,
        assets: &A,
        rng: &mut R,
    ) -> Result<Hand, RollError>
    where
        A: AssetRepository,
        R: Rng,
    {
        let character = roll_character_with_rng(assets, store, revealed, rng)?;
        let tool = roll_tool_with_rng(assets, store, rng)?;
        let damage = self.hand_damage(store, &character, Some(&tool));
        Ok(Hand {
            character,
            tool: Some(tool),
            damage,
        })
    }

    fn hand_damage(&self, store: &StatsStore, character: &str, tool: Option<&str>) -> f64 {
        let record = store.character(character).cloned().unwrap_or_default();
        let tool_record = tool.and_then(|name| store.tool(name));
        damage_index(character, &record, tool_record)
    }

    /// Resolve every hand in join order: special-tool sub-draws, the boss
    /// weakness check, per-user damage rollups, then the evolution and
    /// group-combo bonuses on the accumulated total.
    pub async fn resolve<A, R>(
        &mut self,
        store: &mut StatsStore,
        assets: &A,
        rng: &mut R,
    ) -> Result<RaidResolution, RaidError>
    where
        A: AssetRepository,
        R: Rng,
    {
        self.expect_phase(RaidPhase::Resolving)?;

        let mut resolutions = Vec::with_capacity(self.hands.len());
        let mut groups: Vec<String> = Vec::new();
        let mut total = 0.0_f64;

        let mut hands = std::mem::take(&mut self.hands);
        for entry in &mut hands {
            let character = entry.hand.character.clone();
            store.character_mut(&character).raids_completed += 1;

            let group = store.character_mut(&character).group.clone();
            if group != UNSORTED_GROUP {
                groups.push(group.clone());
            }

            let bonus_draws = self.apply_special_tool(store, assets, &mut entry.hand, rng);

            let weakness_triggered = self.boss_weakness == group
                || self.boss_weakness == character
                || entry.hand.tool.as_deref() == Some(self.boss_weakness.as_str());
            if weakness_triggered {
                entry.hand.damage *= 2.0;
            }

            record_raid_damage(
                store.user_mut(&entry.player),
                round_to_cents(entry.hand.damage),
            );

            let rounded = entry.hand.damage.round();
            total += rounded;

            resolutions.push(PlayerResolution {
                player: entry.player.clone(),
                hand: entry.hand.clone(),
                bonus_draws,
                weakness_triggered,
                rounded_damage: rounded,
            });
        }
        self.hands = hands;

        let evolution_bonus = self.evolution.clone().map(|evolution| {
            let multiplier = store.tool_mut(&evolution.evolved).default_multiplier;
            total *= multiplier;
            EvolutionBonus {
                evolution,
                multiplier,
            }
        });

        let group_combo = detect_group_combo(&groups).map(|combo| {
            total *= combo.multiplier as f64;
            combo
        });

        if let Err(err) = store.save_all().await {
            self.terminate(store).await?;
            return Err(err.into());
        }

        self.total_damage = total;
        self.phase = RaidPhase::Outcome;

        Ok(RaidResolution {
            players: resolutions,
            evolution_bonus,
            group_combo,
            total_damage: total,
        })
    }

    /// Run a special tool's sub-draws, folding their damage into the hand.
    ///
    /// A failed sub-draw skips the remaining bonus; the main hand stands.
    fn apply_special_tool<A, R>(
        &self,
        store: &StatsStore,
        assets: &A,
        hand: &mut Hand,
        rng: &mut R,
    ) -> Vec<BonusDraw>
    where
        A: AssetRepository,
        R: Rng,
    {
        let mut draws = Vec::new();

        match hand.tool.as_deref() {
            Some(BACKUP_TOOL) => {
                match self.draw_hand(store, assets, rng) {
                    Ok(backup) => {
                        hand.damage += backup.damage;
                        draws.push(BonusDraw {
                            character: backup.character,
                            tool: backup.tool,
                            damage: backup.damage,
                        });
                    }
                    Err(err) => warn!(%err, "backup sub-draw failed, skipping bonus"),
                }
            }
            Some(CONVOY_TOOL) => {
                for _ in 0..SUB_DRAW_COUNT {
                    match roll_character_with_rng(assets, store, revealed, rng) {
                        Ok(character) => {
                            let damage = self.hand_damage(store, &character, None);
                            hand.damage += damage;
                            draws.push(BonusDraw {
                                character,
                                tool: None,
                                damage,
                            });
                        }
                        Err(err) => {
                            warn!(%err, "convoy sub-draw failed, skipping bonus");
                            break;
                        }
                    }
                }
            }
            Some(CALL_OF_THE_WILD_TOOL) => {
                for _ in 0..SUB_DRAW_COUNT {
                    let wild = roll_character_with_rng(
                        assets,
                        store,
                        |record| record.group == WILD_GROUP,
                        rng,
                    );
                    match wild {
                        Ok(character) => {
                            let damage = self.hand_damage(store, &character, None);
                            hand.damage += damage;
                            draws.push(BonusDraw {
                                character,
                                tool: None,
                                damage,
                            });
                        }
                        Err(err) => {
                            warn!(%err, "call of the wild sub-draw failed, skipping bonus");
                            break;
                        }
                    }
                }
            }
            _ => {}
        }

        draws
    }

    /// Compare the boss's scaled health against the party total, apply the
    /// outcome's stat mutations, and release the server mutex.
    pub async fn conclude(&mut self, store: &mut StatsStore) -> Result<RaidOutcome, RaidError> {
        self.expect_phase(RaidPhase::Outcome)?;

        store.server_mut(&self.server).total_raids += 1;

        let outcome = if self.boss_health > self.total_damage {
            if self.boss == DEATH_BOSS {
                RaidOutcome::DeathDefeat
            } else {
                store.boss_mut(&self.boss).times_won += 1;
                RaidOutcome::Defeat {
                    boss: self.boss.clone(),
                    remaining_health: self.boss_health - self.total_damage,
                }
            }
        } else {
            self.apply_victory(store)
        };

        self.phase = RaidPhase::Terminal;
        store
            .update_server(&self.server, |server| server.active_raid = false)
            .await?;
        Ok(outcome)
    }

    fn apply_victory(&self, store: &mut StatsStore) -> RaidOutcome {
        store.boss_mut(&self.boss).times_defeated += 1;

        let server = store.server_mut(&self.server);
        server.raid_wins += 1;
        record_server_damage(server, self.total_damage);

        let mut demise = false;
        let mut new_cycle = false;
        if self.mode == RaidMode::Campaign {
            if self.boss == DEMISE_BOSS {
                demise = true;
                store.server_mut(&self.server).campaign = DEATH_BOSS.to_string();
            } else {
                let campaign_id = store.boss_mut(&self.boss).campaign_id.clone();
                match campaign_id.as_deref() {
                    Some(CAMPAIGN_COMPLETE) => {
                        let server = store.server_mut(&self.server);
                        server.campaign = CAMPAIGN_COMPLETE.to_string();
                        server.campaign_completed += 1;
                        new_game_cycle(store, self.config.new_game_health_scaling);
                        new_cycle = true;
                    }
                    Some(next) => {
                        store.server_mut(&self.server).campaign = next.to_string();
                    }
                    None => {
                        store.server_mut(&self.server).campaign = CAMPAIGN_NONE.to_string();
                    }
                }
            }
        }

        for player in &self.players {
            store.user_mut(player).raid_wins += 1;
        }

        let increment = multiplier_increment(self.hard_mode, self.nightmare);
        for entry in &self.hands {
            store.character_mut(&entry.hand.character).raids_won += 1;
            if let Some(tool) = &entry.hand.tool {
                apply_practice_bonus(store.tool_mut(tool), &entry.hand.character, increment);
            }
        }

        RaidOutcome::Victory {
            boss: self.boss.clone(),
            damage: self.total_damage,
            demise,
            new_cycle,
        }
    }

    /// Abandon the session from any phase, releasing the server mutex.
    ///
    /// The gateway calls this when session processing fails unexpectedly,
    /// so a stuck mutex never outlives its session.
    pub async fn abort(&mut self, store: &mut StatsStore) -> Result<(), RaidError> {
        self.terminate(store).await
    }

    async fn terminate(&mut self, store: &mut StatsStore) -> Result<(), RaidError> {
        self.phase = RaidPhase::Terminal;
        release_mutex(store, &self.server).await?;
        Ok(())
    }

    fn expect_phase(&self, expected: RaidPhase) -> Result<(), RaidError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(RaidError::WrongPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    pub fn phase(&self) -> RaidPhase {
        self.phase
    }

    pub fn mode(&self) -> RaidMode {
        self.mode
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn players(&self) -> &[String] {
        &self.players
    }

    pub fn boss(&self) -> &str {
        &self.boss
    }

    pub fn boss_health(&self) -> f64 {
        self.boss_health
    }

    pub fn boss_image(&self) -> ImageRef {
        ImageRef::new(AssetCategory::Bosses, self.boss.clone())
    }

    pub fn is_hard_mode(&self) -> bool {
        self.hard_mode
    }

    pub fn is_nightmare(&self) -> bool {
        self.nightmare
    }

    pub fn total_damage(&self) -> f64 {
        self.total_damage
    }
}

async fn release_mutex(store: &mut StatsStore, server: &str) -> Result<(), StoreError> {
    store
        .update_server(server, |server| server.active_raid = false)
        .await
}

/// New-game cycle: scale every boss baseline except the death boss.
fn new_game_cycle(store: &mut StatsStore, scaling: f64) {
    for (name, boss) in store.bosses.iter_mut() {
        if name != DEATH_BOSS {
            boss.health *= scaling;
        }
    }
}

/// Detect duplicated groups across the party.
///
/// The multiplier is `2 * (total entries - distinct groups)`; one shared
/// group yields x2, a three-way stack yields x4.
fn detect_group_combo(groups: &[String]) -> Option<GroupCombo> {
    let mut seen = Vec::new();
    let mut duplicated = Vec::new();
    for group in groups {
        if seen.contains(group) {
            if !duplicated.contains(group) {
                duplicated.push(group.clone());
            }
        } else {
            seen.push(group.clone());
        }
    }

    let duplicates = groups.len() - seen.len();
    if duplicates == 0 {
        return None;
    }

    Some(GroupCombo {
        groups: duplicated,
        multiplier: 2 * duplicates as u32,
    })
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_group_combo_one_duplicate() {
        let combo = detect_group_combo(&groups(&["warriors", "warriors", "classics"]))
            .expect("combo");
        assert_eq!(combo.multiplier, 2);
        assert_eq!(combo.groups, vec!["warriors".to_string()]);
    }

    #[test]
    fn test_group_combo_triple_stack() {
        let combo = detect_group_combo(&groups(&["a", "a", "a"])).expect("combo");
        assert_eq!(combo.multiplier, 4);
        assert_eq!(combo.groups, vec!["a".to_string()]);
    }

    #[test]
    fn test_group_combo_none_when_distinct() {
        assert!(detect_group_combo(&groups(&["a", "b", "c"])).is_none());
        assert!(detect_group_combo(&[]).is_none());
    }

    #[test]
    fn test_round_to_cents() {
        assert_eq!(round_to_cents(12.345), 12.35);
        assert_eq!(round_to_cents(12.344), 12.34);
    }
}
