//! The death encounter vote.
//!
//! Losing a raid against the death boss opens a short vote: any
//! participant may press on (face death again) or retreat (reset the
//! campaign to a completed state). The last press before the window
//! closes is authoritative, and silence counts as retreat.

use crate::config::GameConfig;
use crate::model::{CAMPAIGN_COMPLETE, DEATH_BOSS};
use crate::store::{StatsStore, StoreError};
use std::time::Duration;

/// How the party answered the death prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathChoice {
    /// Keep the campaign pointed at the death boss.
    PressOn,
    /// Reset the campaign pointer to the completed state.
    Retreat,
}

/// Outcome of a finished death encounter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeathVerdict {
    pub choice: DeathChoice,
    /// How many presses landed on press-on over the whole window.
    pub brave: u32,
    /// How many presses landed on retreat over the whole window.
    pub cowardly: u32,
}

/// A pending death vote for one server.
pub struct DeathEncounter {
    server: String,
    window: Duration,
    brave: u32,
    cowardly: u32,
    last: Option<DeathChoice>,
}

impl DeathEncounter {
    pub fn new(server_name: &str, config: &GameConfig) -> Self {
        Self {
            server: server_name.to_string(),
            window: config.death_vote_window,
            brave: 0,
            cowardly: 0,
            last: None,
        }
    }

    /// How long the gateway should keep the vote open.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record one press. Repeat presses are counted, not deduplicated, and
    /// the most recent press decides the verdict.
    pub fn press(&mut self, choice: DeathChoice) {
        match choice {
            DeathChoice::PressOn => self.brave += 1,
            DeathChoice::Retreat => self.cowardly += 1,
        }
        self.last = Some(choice);
    }

    /// Close the vote and write the campaign pointer.
    ///
    /// No presses at all defaults to retreat.
    pub async fn finish(self, store: &mut StatsStore) -> Result<DeathVerdict, StoreError> {
        let choice = self.last.unwrap_or(DeathChoice::Retreat);
        let campaign = match choice {
            DeathChoice::PressOn => DEATH_BOSS,
            DeathChoice::Retreat => CAMPAIGN_COMPLETE,
        };
        store
            .update_server(&self.server, |server| {
                server.campaign = campaign.to_string();
            })
            .await?;
        Ok(DeathVerdict {
            choice,
            brave: self.brave,
            cowardly: self.cowardly,
        })
    }
}
