//! Player-versus-player duels.
//!
//! A duel opens as a challenge, waits for a challenger, then plays a
//! best-of-three. Each round both sides draw a character and a tool from
//! the known roster and compare damage; tied rounds are replayed and do
//! not count toward the score. An expired challenge records nothing.

use crate::config::GameConfig;
use crate::damage::damage_index;
use crate::model::Hand;
use crate::store::{StatsStore, StoreError};
use rand::Rng;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Rounds won to take the match.
pub const ROUNDS_TO_WIN: u32 = 2;

/// Hard cap on played rounds, counting replayed ties.
const MAX_ROUNDS: u32 = 100;

#[derive(Debug, Error)]
pub enum PvpError {
    #[error("the challenger cannot be the host")]
    HostCannotAccept,

    #[error("duel is in the {actual:?} phase, expected {expected:?}")]
    WrongPhase {
        expected: PvpPhase,
        actual: PvpPhase,
    },

    #[error("no known characters to duel with")]
    NoCharacters,

    #[error("no known tools to duel with")]
    NoTools,

    #[error("duel exceeded {0} rounds without a winner")]
    Exhausted(u32),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Duel lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PvpPhase {
    AwaitingChallenger,
    Battling,
    Terminal,
}

/// One played round. `winner` is `None` when the round tied and was
/// replayed.
#[derive(Debug, Clone)]
pub struct PvpRound {
    pub number: u32,
    pub host_hand: Hand,
    pub challenger_hand: Hand,
    pub winner: Option<String>,
}

/// Final result of a decided duel.
#[derive(Debug, Clone)]
pub struct PvpVerdict {
    pub winner: String,
    pub loser: String,
    pub host_score: u32,
    pub challenger_score: u32,
    pub rounds: Vec<PvpRound>,
}

/// A duel between two users on one server.
pub struct PvpSession {
    server: String,
    host: String,
    challenger: Option<String>,
    join_window: Duration,
    phase: PvpPhase,
}

impl PvpSession {
    pub fn new(server_name: &str, host: &str, config: &GameConfig) -> Self {
        Self {
            server: server_name.to_string(),
            host: host.to_string(),
            challenger: None,
            join_window: config.pvp_join_window,
            phase: PvpPhase::AwaitingChallenger,
        }
    }

    /// How long the gateway should keep the challenge open.
    pub fn join_window(&self) -> Duration {
        self.join_window
    }

    pub fn phase(&self) -> PvpPhase {
        self.phase
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn challenger(&self) -> Option<&str> {
        self.challenger.as_deref()
    }

    /// Accept the open challenge. Hosts cannot duel themselves.
    pub fn accept(&mut self, challenger: &str) -> Result<(), PvpError> {
        self.expect_phase(PvpPhase::AwaitingChallenger)?;
        if challenger == self.host {
            return Err(PvpError::HostCannotAccept);
        }
        self.challenger = Some(challenger.to_string());
        self.phase = PvpPhase::Battling;
        Ok(())
    }

    /// Close an unanswered challenge. Records nothing.
    pub fn expire(&mut self) {
        self.phase = PvpPhase::Terminal;
    }

    /// Play the match to a decision and persist the stat rollups.
    pub async fn battle<R: Rng>(
        &mut self,
        store: &mut StatsStore,
        rng: &mut R,
    ) -> Result<PvpVerdict, PvpError> {
        self.expect_phase(PvpPhase::Battling)?;
        let challenger = match self.challenger.clone() {
            Some(challenger) => challenger,
            None => {
                return Err(PvpError::WrongPhase {
                    expected: PvpPhase::Battling,
                    actual: self.phase,
                })
            }
        };

        let mut host_score = 0;
        let mut challenger_score = 0;
        let mut rounds = Vec::new();
        let mut number = 0;

        while host_score < ROUNDS_TO_WIN && challenger_score < ROUNDS_TO_WIN {
            number += 1;
            if number > MAX_ROUNDS {
                self.phase = PvpPhase::Terminal;
                return Err(PvpError::Exhausted(MAX_ROUNDS));
            }

            let host_hand = draw_duel_hand(store, rng)?;
            let challenger_hand = draw_duel_hand(store, rng)?;

            let winner = if host_hand.damage > challenger_hand.damage {
                host_score += 1;
                Some(self.host.clone())
            } else if challenger_hand.damage > host_hand.damage {
                challenger_score += 1;
                Some(challenger.clone())
            } else {
                None
            };

            // A replayed tie is still a played round for both characters.
            store.character_mut(&host_hand.character).total_pvp += 1;
            store.character_mut(&challenger_hand.character).total_pvp += 1;
            if let Some(winner) = &winner {
                let winning_character = if winner == &self.host {
                    host_hand.character.clone()
                } else {
                    challenger_hand.character.clone()
                };
                store.character_mut(&winning_character).pvp_wins += 1;
            }

            rounds.push(PvpRound {
                number,
                host_hand,
                challenger_hand,
                winner,
            });
        }

        let (winner, loser) = if host_score >= ROUNDS_TO_WIN {
            (self.host.clone(), challenger.clone())
        } else {
            (challenger.clone(), self.host.clone())
        };

        store.user_mut(&self.host).total_pvp += 1;
        store.user_mut(&challenger).total_pvp += 1;
        store.user_mut(&winner).pvp_wins += 1;
        store.server_mut(&self.server).total_pvp += 1;
        store.save_all().await?;

        self.phase = PvpPhase::Terminal;
        Ok(PvpVerdict {
            winner,
            loser,
            host_score,
            challenger_score,
            rounds,
        })
    }

    fn expect_phase(&self, expected: PvpPhase) -> Result<(), PvpError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(PvpError::WrongPhase {
                expected,
                actual: self.phase,
            })
        }
    }
}

/// Draw one character and tool from the known roster.
fn draw_duel_hand<R: Rng>(store: &StatsStore, rng: &mut R) -> Result<Hand, PvpError> {
    let character = sample_key(&store.characters, rng)
        .ok_or(PvpError::NoCharacters)?
        .to_string();
    let tool = sample_key(&store.tools, rng)
        .ok_or(PvpError::NoTools)?
        .to_string();

    let record = store.characters.get(&character).cloned().unwrap_or_default();
    let damage = damage_index(&character, &record, store.tools.get(&tool));

    Ok(Hand {
        character,
        tool: Some(tool),
        damage,
    })
}

// Map iteration order is unstable, so sample over sorted keys to keep
// seeded draws reproducible.
fn sample_key<'a, T, R: Rng>(map: &'a HashMap<String, T>, rng: &mut R) -> Option<&'a str> {
    let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
    if keys.is_empty() {
        return None;
    }
    keys.sort_unstable();
    Some(keys[rng.gen_range(0..keys.len())])
}
