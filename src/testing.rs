//! Shared fixtures for unit and integration tests.

use crate::assets::{AssetCategory, AssetRepository};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::io;

/// A deterministic generator for reproducible draws.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// An in-memory asset listing, so tests never touch an image directory.
#[derive(Debug, Default, Clone)]
pub struct MemoryAssets {
    listings: HashMap<AssetCategory, Vec<String>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<I, S>(mut self, category: AssetCategory, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.listings
            .entry(category)
            .or_default()
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_characters<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(AssetCategory::Characters, names)
    }

    pub fn with_tools<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(AssetCategory::Tools, names)
    }

    pub fn with_bosses<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(AssetCategory::Bosses, names)
    }

    pub fn with_rare_cards<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(AssetCategory::RareCards, names)
    }
}

impl AssetRepository for MemoryAssets {
    fn list(&self, category: AssetCategory) -> Vec<String> {
        self.listings.get(&category).cloned().unwrap_or_default()
    }

    fn open(&self, category: AssetCategory, name: &str) -> io::Result<Vec<u8>> {
        if self.exists(category, name) {
            Ok(Vec::new())
        } else {
            Err(io::Error::new(io::ErrorKind::NotFound, name.to_string()))
        }
    }
}
