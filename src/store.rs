//! The statistics store: five keyed record collections with get-or-create
//! semantics and whole-collection persistence.
//!
//! The store is constructed once at process start and passed by mutable
//! reference into every session. Persistence is "serialize the whole
//! collection, replace the file": each collection is written to a temp file
//! and atomically renamed into place, so a crash mid-write leaves the old
//! snapshot intact.
//!
//! A malformed or missing file on load never fails the caller: the affected
//! collection resets to empty and a warning is logged.

use crate::model::{BossRecord, CharacterRecord, ServerRecord, ToolRecord, UserRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::warn;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// File locations for the five persisted collections.
#[derive(Debug, Clone)]
pub struct StorePaths {
    pub characters: PathBuf,
    pub bosses: PathBuf,
    pub tools: PathBuf,
    pub users: PathBuf,
    pub servers: PathBuf,
}

impl StorePaths {
    /// Derive the standard file layout under a data directory.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let dir = data_dir.as_ref();
        Self {
            characters: dir.join("character_stats.json"),
            bosses: dir.join("boss_stats.json"),
            tools: dir.join("tool_stats.json"),
            users: dir.join("user_stats.json"),
            servers: dir.join("server_stats.json"),
        }
    }
}

/// Durable keyed storage for all game statistics.
///
/// Character and user keys are case-folded; boss, tool, and server keys are
/// stored as given. Lookups through the `*_mut` accessors create zero-valued
/// records on first reference and never fail.
#[derive(Debug)]
pub struct StatsStore {
    paths: StorePaths,
    pub characters: HashMap<String, CharacterRecord>,
    pub bosses: HashMap<String, BossRecord>,
    pub tools: HashMap<String, ToolRecord>,
    pub users: HashMap<String, UserRecord>,
    pub servers: HashMap<String, ServerRecord>,
}

impl StatsStore {
    /// Create an empty store that will persist to `paths`.
    pub fn new(paths: StorePaths) -> Self {
        Self {
            paths,
            characters: HashMap::new(),
            bosses: HashMap::new(),
            tools: HashMap::new(),
            users: HashMap::new(),
            servers: HashMap::new(),
        }
    }

    /// Load every collection from disk.
    ///
    /// Missing or malformed files reset that collection to empty. The
    /// `active_raid` flag is forcibly cleared on every server record so
    /// that a crashed raid never wedges its server.
    pub async fn load(paths: StorePaths) -> Self {
        let mut store = Self {
            characters: load_collection(&paths.characters).await,
            bosses: load_collection(&paths.bosses).await,
            tools: load_collection(&paths.tools).await,
            users: load_collection(&paths.users).await,
            servers: load_collection(&paths.servers).await,
            paths,
        };

        for server in store.servers.values_mut() {
            server.active_raid = false;
        }

        store
    }

    /// Persist every collection as a snapshot.
    pub async fn save_all(&self) -> Result<(), StoreError> {
        save_collection(&self.paths.characters, &self.characters).await?;
        save_collection(&self.paths.bosses, &self.bosses).await?;
        save_collection(&self.paths.tools, &self.tools).await?;
        save_collection(&self.paths.users, &self.users).await?;
        save_collection(&self.paths.servers, &self.servers).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Get-or-create accessors
    // ------------------------------------------------------------------

    /// Get a character record, creating a zero-valued one on first reference.
    pub fn character_mut(&mut self, name: &str) -> &mut CharacterRecord {
        self.characters.entry(name.to_lowercase()).or_default()
    }

    pub fn boss_mut(&mut self, name: &str) -> &mut BossRecord {
        self.bosses.entry(name.to_string()).or_default()
    }

    pub fn tool_mut(&mut self, name: &str) -> &mut ToolRecord {
        self.tools.entry(name.to_string()).or_default()
    }

    /// Get a user record, creating a zero-valued one on first reference.
    pub fn user_mut(&mut self, name: &str) -> &mut UserRecord {
        self.users.entry(name.to_lowercase()).or_default()
    }

    pub fn server_mut(&mut self, name: &str) -> &mut ServerRecord {
        self.servers.entry(name.to_string()).or_default()
    }

    // ------------------------------------------------------------------
    // Non-creating lookups
    // ------------------------------------------------------------------

    pub fn character(&self, name: &str) -> Option<&CharacterRecord> {
        self.characters.get(&name.to_lowercase())
    }

    pub fn boss(&self, name: &str) -> Option<&BossRecord> {
        self.bosses.get(name)
    }

    pub fn tool(&self, name: &str) -> Option<&ToolRecord> {
        self.tools.get(name)
    }

    pub fn user(&self, name: &str) -> Option<&UserRecord> {
        self.users.get(&name.to_lowercase())
    }

    pub fn server(&self, name: &str) -> Option<&ServerRecord> {
        self.servers.get(name)
    }

    // ------------------------------------------------------------------
    // Mutate-and-persist helpers
    // ------------------------------------------------------------------

    /// Apply `apply` to a character record, then persist all collections.
    pub async fn update_character<F>(&mut self, name: &str, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut CharacterRecord),
    {
        apply(self.character_mut(name));
        self.save_all().await
    }

    pub async fn update_boss<F>(&mut self, name: &str, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BossRecord),
    {
        apply(self.boss_mut(name));
        self.save_all().await
    }

    pub async fn update_tool<F>(&mut self, name: &str, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut ToolRecord),
    {
        apply(self.tool_mut(name));
        self.save_all().await
    }

    pub async fn update_user<F>(&mut self, name: &str, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut UserRecord),
    {
        apply(self.user_mut(name));
        self.save_all().await
    }

    pub async fn update_server<F>(&mut self, name: &str, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut ServerRecord),
    {
        apply(self.server_mut(name));
        self.save_all().await
    }
}

async fn load_collection<T: DeserializeOwned>(path: &Path) -> HashMap<String, T> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), %err, "failed to read collection, starting empty");
            }
            return HashMap::new();
        }
    };

    match serde_json::from_str(&content) {
        Ok(map) => map,
        Err(err) => {
            warn!(path = %path.display(), %err, "malformed collection file, starting empty");
            HashMap::new()
        }
    }
}

/// Write the collection to a temp file, then atomically rename it into place.
async fn save_collection<T: Serialize>(
    path: &Path,
    collection: &HashMap<String, T>,
) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let content = serde_json::to_string_pretty(collection)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, StatsStore) {
        let dir = TempDir::new().expect("temp dir");
        let store = StatsStore::new(StorePaths::new(dir.path()));
        (dir, store)
    }

    #[test]
    fn test_get_or_create_case_folds_characters_and_users() {
        let (_dir, mut store) = temp_store();

        store.character_mut("The Gorb").count = 4;
        assert_eq!(store.character("the gorb").unwrap().count, 4);
        assert!(store.characters.contains_key("the gorb"));

        store.user_mut("Alice").total_rolls = 2;
        assert_eq!(store.user("ALICE").unwrap().total_rolls, 2);
    }

    #[test]
    fn test_boss_and_tool_keys_keep_case() {
        let (_dir, mut store) = temp_store();
        store.boss_mut("Tipp Tronix").health = 90.0;
        assert!(store.boss("Tipp Tronix").is_some());
        assert!(store.boss("tipp tronix").is_none());
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let (dir, mut store) = temp_store();

        store.character_mut("gorb").count = 7;
        store.boss_mut("david").health = 50.0;
        store.tool_mut("wok28").default_multiplier = 1.5;
        store.user_mut("alice").raid_wins = 3;
        store.server_mut("guild").total_raids = 9;

        store.save_all().await.expect("save");

        let loaded = StatsStore::load(StorePaths::new(dir.path())).await;
        assert_eq!(loaded.characters, store.characters);
        assert_eq!(loaded.bosses, store.bosses);
        assert_eq!(loaded.tools, store.tools);
        assert_eq!(loaded.users, store.users);
        assert_eq!(loaded.servers, store.servers);
    }

    #[tokio::test]
    async fn test_active_raid_reset_on_load() {
        let (dir, mut store) = temp_store();
        store.server_mut("guild").active_raid = true;
        store.save_all().await.expect("save");

        let loaded = StatsStore::load(StorePaths::new(dir.path())).await;
        assert!(!loaded.server("guild").unwrap().active_raid);
    }

    #[tokio::test]
    async fn test_malformed_file_resets_collection() {
        let dir = TempDir::new().expect("temp dir");
        let paths = StorePaths::new(dir.path());
        std::fs::write(&paths.characters, "{not valid json").expect("write");

        let loaded = StatsStore::load(paths).await;
        assert!(loaded.characters.is_empty());
    }

    #[tokio::test]
    async fn test_missing_files_load_empty() {
        let dir = TempDir::new().expect("temp dir");
        let loaded = StatsStore::load(StorePaths::new(dir.path())).await;
        assert!(loaded.characters.is_empty());
        assert!(loaded.servers.is_empty());
    }

    #[tokio::test]
    async fn test_update_helper_persists() {
        let (dir, mut store) = temp_store();
        store
            .update_user("alice", |user| user.tolls += 1)
            .await
            .expect("update");

        let loaded = StatsStore::load(StorePaths::new(dir.path())).await;
        assert_eq!(loaded.user("alice").unwrap().tolls, 1);
    }
}
