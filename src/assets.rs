//! Asset repository boundary.
//!
//! The core never touches image bytes itself; it samples identifiers from a
//! repository and hands [`ImageRef`]s back to the gateway for display. A
//! directory-backed implementation is provided for deployments that keep
//! their art on disk; tests use [`crate::testing::MemoryAssets`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::PathBuf;

/// File extensions accepted as card art.
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// The asset categories the game draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetCategory {
    Characters,
    Tools,
    Bosses,
    RareCards,
    Evolutions,
    Misc,
}

impl AssetCategory {
    /// Conventional subdirectory name under the asset root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            AssetCategory::Characters => "characters",
            AssetCategory::Tools => "items",
            AssetCategory::Bosses => "bosses",
            AssetCategory::RareCards => "ex",
            AssetCategory::Evolutions => "evolutions",
            AssetCategory::Misc => "utility",
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

/// A displayable image reference returned to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub category: AssetCategory,
    pub name: String,
}

impl ImageRef {
    pub fn new(category: AssetCategory, name: impl Into<String>) -> Self {
        Self {
            category,
            name: name.into(),
        }
    }
}

/// Keyed lookup of game art, external to the combat core.
pub trait AssetRepository {
    /// List every identifier in a category, in a stable order.
    fn list(&self, category: AssetCategory) -> Vec<String>;

    /// Whether an identifier exists in a category.
    fn exists(&self, category: AssetCategory, name: &str) -> bool {
        self.list(category).iter().any(|n| n == name)
    }

    /// Open the asset's bytes for display.
    fn open(&self, category: AssetCategory, name: &str) -> io::Result<Vec<u8>>;
}

/// Directory-backed asset repository.
///
/// Each category is a subdirectory of the root; identifiers are file stems
/// of files whose extension is in [`ALLOWED_IMAGE_EXTENSIONS`]. Stray files
/// with other extensions are ignored.
#[derive(Debug, Clone)]
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn find_file(&self, category: AssetCategory, name: &str) -> Option<PathBuf> {
        let dir = self.root.join(category.dir_name());
        for ext in ALLOWED_IMAGE_EXTENSIONS {
            let candidate = dir.join(format!("{name}.{ext}"));
            if candidate.exists() {
                return Some(candidate);
            }
        }
        None
    }
}

impl AssetRepository for DirAssets {
    fn list(&self, category: AssetCategory) -> Vec<String> {
        let dir = self.root.join(category.dir_name());
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ALLOWED_IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(String::from)
            })
            .collect();

        names.sort();
        names
    }

    fn exists(&self, category: AssetCategory, name: &str) -> bool {
        self.find_file(category, name).is_some()
    }

    fn open(&self, category: AssetCategory, name: &str) -> io::Result<Vec<u8>> {
        let path = self.find_file(category, name).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no {category} asset named {name}"),
            )
        })?;
        std::fs::read(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_dir_assets_lists_stems_and_filters_extensions() {
        let dir = TempDir::new().expect("temp dir");
        let characters = dir.path().join("characters");
        std::fs::create_dir_all(&characters).expect("mkdir");
        std::fs::write(characters.join("gorb.png"), b"img").expect("write");
        std::fs::write(characters.join("dave.jpg"), b"img").expect("write");
        std::fs::write(characters.join("notes.txt"), b"junk").expect("write");

        let assets = DirAssets::new(dir.path());
        let listed = assets.list(AssetCategory::Characters);
        assert_eq!(listed, vec!["dave".to_string(), "gorb".to_string()]);

        assert!(assets.exists(AssetCategory::Characters, "gorb"));
        assert!(!assets.exists(AssetCategory::Characters, "notes"));
        assert_eq!(
            assets.open(AssetCategory::Characters, "gorb").unwrap(),
            b"img"
        );
    }

    #[test]
    fn test_missing_category_lists_empty() {
        let dir = TempDir::new().expect("temp dir");
        let assets = DirAssets::new(dir.path());
        assert!(assets.list(AssetCategory::Bosses).is_empty());
        assert!(assets.open(AssetCategory::Bosses, "david").is_err());
    }
}
