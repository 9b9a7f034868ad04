//! Card-roll and raid game engine for chat platforms.
//!
//! This crate provides:
//! - Card rolls with rare-card drops, curses, and leaderboard callouts
//! - Cooperative boss raids with campaign progression and difficulty tiers
//! - Tool evolutions, group combos, and boss weaknesses
//! - Best-of-three PVP duels
//! - JSON-backed persistent statistics
//!
//! The gateway (the chat-platform adapter) owns timing and rendering; this
//! crate owns every game rule and all persistent state.
//!
//! # Quick Start
//!
//! ```ignore
//! use gacha_core::{
//!     DirAssets, GameConfig, RaidMode, RaidSession, StatsStore, StorePaths,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut store = StatsStore::load(StorePaths::new("data")).await;
//!     let assets = DirAssets::new("images");
//!     let mut rng = rand::thread_rng();
//!
//!     let (mut raid, announcement) = RaidSession::start(
//!         &mut store,
//!         &assets,
//!         GameConfig::default(),
//!         RaidMode::Campaign,
//!         "my-server",
//!         "alice",
//!         &mut rng,
//!     )
//!     .await?;
//!     println!("{}", announcement.wake_message);
//!
//!     raid.close_join_window()?;
//!     raid.draw(&mut store, &assets, &mut rng).await?;
//!     raid.resolve(&mut store, &assets, &mut rng).await?;
//!     let outcome = raid.conclude(&mut store).await?;
//!     println!("{outcome:?}");
//!     Ok(())
//! }
//! ```

pub mod assets;
pub mod commands;
pub mod config;
pub mod damage;
pub mod death;
pub mod evolution;
pub mod messages;
pub mod model;
pub mod pvp;
pub mod raid;
pub mod roll;
pub mod stats;
pub mod store;
pub mod testing;

// Primary public API
pub use assets::{AssetCategory, AssetRepository, DirAssets, ImageRef};
pub use commands::{CommandError, Narration, RollOutcome};
pub use config::GameConfig;
pub use death::{DeathChoice, DeathEncounter, DeathVerdict};
pub use evolution::Evolution;
pub use model::{Hand, RaidMode};
pub use pvp::{PvpError, PvpSession, PvpVerdict};
pub use raid::{
    DrawResult, RaidError, RaidOutcome, RaidResolution, RaidSession,
};
pub use roll::RollError;
pub use stats::RollTier;
pub use store::{StatsStore, StoreError, StorePaths};
