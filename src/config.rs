//! Tunable game constants.
//!
//! Sessions take a [`GameConfig`] by value at construction. The defaults
//! match the live deployment; tests override individual knobs with the
//! builder setters.

use std::time::Duration;

/// Difficulty and pacing knobs shared by every session type.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// How long the raid join window stays open.
    pub join_window: Duration,

    /// How long a PVP challenge waits for an acceptor.
    pub pvp_join_window: Duration,

    /// How long the death-encounter vote stays open.
    pub death_vote_window: Duration,

    /// Participant count at which hard mode kicks in.
    pub hard_mode_threshold: usize,

    /// Participant count at which nightmare mode kicks in.
    /// Takes precedence over hard mode.
    pub nightmare_threshold: usize,

    /// Boss health multiplier under hard mode.
    pub hard_mode_health: f64,

    /// Boss health multiplier under nightmare mode.
    pub nightmare_health: f64,

    /// Extra health fraction per completed campaign cycle.
    pub campaign_health_scaling: f64,

    /// Boss baseline scaling applied by the new-game cycle.
    pub new_game_health_scaling: f64,

    /// One-in-N odds of a rare-card unlock per roll.
    pub ex_card_odds: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            join_window: Duration::from_secs(60),
            pvp_join_window: Duration::from_secs(60),
            death_vote_window: Duration::from_secs(7),
            hard_mode_threshold: 4,
            nightmare_threshold: 5,
            hard_mode_health: 1.5,
            nightmare_health: 2.0,
            campaign_health_scaling: 0.25,
            new_game_health_scaling: 1.25,
            ex_card_odds: 777,
        }
    }
}

impl GameConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raid join window.
    pub fn with_join_window(mut self, window: Duration) -> Self {
        self.join_window = window;
        self
    }

    /// Set the PVP join window.
    pub fn with_pvp_join_window(mut self, window: Duration) -> Self {
        self.pvp_join_window = window;
        self
    }

    /// Set the difficulty thresholds (hard mode, nightmare).
    pub fn with_difficulty_thresholds(mut self, hard: usize, nightmare: usize) -> Self {
        self.hard_mode_threshold = hard;
        self.nightmare_threshold = nightmare;
        self
    }

    /// Set the rare-card odds to one in `odds`.
    pub fn with_ex_card_odds(mut self, odds: u32) -> Self {
        self.ex_card_odds = odds;
        self
    }
}
