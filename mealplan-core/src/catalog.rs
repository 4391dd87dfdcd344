//! The recipe catalog: two seasonal collections of recipes.
//!
//! A catalog is loaded once per session from the newest
//! `recipes_YYYY-MM-DD.json`. Edits go through `upsert` and `remove` on a
//! copy, which is then saved as a new snapshot. Stored as:
//!
//! ```json
//! { "winter_recipes": [ ... ], "summer_recipes": [ ... ] }
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::filename::recipes_filename;
use crate::models::{RecipeRecord, Season};
use crate::storage::{BlobKind, BlobStore, StorageError};

/// Catalog shipped with the application, used when no dated snapshot exists.
pub const BUNDLED_RECIPES: &str = "recipes.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecipeCatalog {
    pub winter_recipes: Vec<RecipeRecord>,
    pub summer_recipes: Vec<RecipeRecord>,
}

impl RecipeCatalog {
    pub fn new(winter_recipes: Vec<RecipeRecord>, summer_recipes: Vec<RecipeRecord>) -> Self {
        let mut catalog = Self {
            winter_recipes,
            summer_recipes,
        };
        catalog.stamp_seasons();
        catalog
    }

    /// Parses a stored catalog. A recipe's season is always the collection
    /// it sits in, whatever the record itself says. Recipes that cannot be
    /// read are skipped; the rest of the catalog still loads.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        struct Stored {
            #[serde(default)]
            winter_recipes: Option<Vec<Value>>,
            #[serde(default)]
            summer_recipes: Option<Vec<Value>>,
        }

        let stored = Stored::deserialize(value)?;
        Ok(Self::new(
            read_recipes(stored.winter_recipes.unwrap_or_default(), Season::Winter),
            read_recipes(stored.summer_recipes.unwrap_or_default(), Season::Summer),
        ))
    }

    fn stamp_seasons(&mut self) {
        for recipe in &mut self.winter_recipes {
            recipe.season = Season::Winter;
        }
        for recipe in &mut self.summer_recipes {
            recipe.season = Season::Summer;
        }
    }

    pub fn recipes(&self, season: Season) -> &[RecipeRecord] {
        match season {
            Season::Winter => &self.winter_recipes,
            Season::Summer => &self.summer_recipes,
        }
    }

    fn recipes_mut(&mut self, season: Season) -> &mut Vec<RecipeRecord> {
        match season {
            Season::Winter => &mut self.winter_recipes,
            Season::Summer => &mut self.summer_recipes,
        }
    }

    /// Adds `recipe` to the collection of its season, replacing the recipe
    /// of the same name there. Returns the replaced recipe.
    pub fn upsert(&mut self, recipe: RecipeRecord) -> Option<RecipeRecord> {
        let recipes = self.recipes_mut(recipe.season);
        match recipes.iter_mut().find(|r| r.name == recipe.name) {
            Some(existing) => Some(std::mem::replace(existing, recipe)),
            None => {
                recipes.push(recipe);
                None
            }
        }
    }

    /// Removes the recipe named exactly `name` from one season's collection.
    pub fn remove(&mut self, season: Season, name: &str) -> Option<RecipeRecord> {
        let recipes = self.recipes_mut(season);
        let idx = recipes.iter().position(|r| r.name == name)?;
        Some(recipes.remove(idx))
    }

    /// Every recipe, winter collection first.
    pub fn iter(&self) -> impl Iterator<Item = &RecipeRecord> {
        self.winter_recipes.iter().chain(self.summer_recipes.iter())
    }

    pub fn len(&self) -> usize {
        self.winter_recipes.len() + self.summer_recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First recipe named exactly `name`, searching winter then summer.
    pub fn find(&self, name: &str) -> Option<&RecipeRecord> {
        self.iter().find(|recipe| recipe.name == name)
    }

    /// Distinct, sorted sections of one season's collection.
    pub fn sections(&self, season: Season) -> Vec<&str> {
        let mut sections: Vec<&str> = self
            .recipes(season)
            .iter()
            .filter_map(|r| r.section.as_deref())
            .filter(|s| !s.is_empty())
            .collect();
        sections.sort_unstable();
        sections.dedup();
        sections
    }

    /// Picker-style filtering: optional season and section, plus a
    /// case-insensitive substring match on the name.
    pub fn filter(
        &self,
        season: Option<Season>,
        section: Option<&str>,
        search: &str,
    ) -> Vec<&RecipeRecord> {
        let needle = search.trim().to_lowercase();
        self.iter()
            .filter(|r| season.map_or(true, |s| r.season == s))
            .filter(|r| section.map_or(true, |s| r.section.as_deref() == Some(s)))
            .filter(|r| needle.is_empty() || r.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Loads the newest readable catalog snapshot, falling back to the
    /// bundled catalog and then to an empty one.
    ///
    /// Returns the catalog and the file it came from.
    pub fn load_latest(store: &dyn BlobStore) -> Result<(Self, Option<String>), StorageError> {
        let mut candidates = store.list(BlobKind::Recipes)?;
        candidates.sort_unstable_by(|a, b| b.cmp(a));
        candidates.push(BUNDLED_RECIPES.to_string());

        for name in candidates {
            let Some(value) = store.read(&name)? else {
                continue;
            };
            match Self::from_value(&value) {
                Ok(catalog) => {
                    tracing::info!("Loaded {} recipe(s) from {}", catalog.len(), name);
                    return Ok((catalog, Some(name)));
                }
                Err(e) => tracing::warn!("Ignoring recipe file {}: {}", name, e),
            }
        }

        tracing::info!("No recipe file found, starting with an empty catalog");
        Ok((Self::default(), None))
    }

    /// Writes this catalog as the snapshot for `date`, replacing any
    /// snapshot already saved that day.
    pub fn save(&self, store: &dyn BlobStore, date: NaiveDate) -> Result<String, StorageError> {
        let name = recipes_filename(date);
        let value = serde_json::to_value(self).map_err(|source| StorageError::Serialize {
            name: name.clone(),
            source,
        })?;
        store.write(&name, &value)?;
        tracing::info!("Saved {} recipe(s) to {}", self.len(), name);
        Ok(name)
    }
}

fn read_recipes(raw: Vec<Value>, season: Season) -> Vec<RecipeRecord> {
    raw.iter()
        .enumerate()
        .filter_map(|(i, value)| match RecipeRecord::deserialize(value) {
            Ok(recipe) => Some(recipe),
            Err(e) => {
                tracing::warn!("Skipping unreadable {} recipe #{}: {}", season, i + 1, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryBlobStore;
    use serde_json::json;

    fn sample() -> RecipeCatalog {
        RecipeCatalog::new(
            vec![
                RecipeRecord::new("Chili", Season::Winter)
                    .with_section("Mains")
                    .with_tags(["spicy"]),
                RecipeRecord::new("Leek Soup", Season::Winter).with_section("Soups"),
            ],
            vec![
                RecipeRecord::new("Gazpacho", Season::Summer).with_section("Soups"),
                RecipeRecord::new("Chili", Season::Summer).with_section("Mains"),
            ],
        )
    }

    #[test]
    fn test_from_value_stamps_seasons() {
        let value = json!({
            "winter_recipes": [{ "name": "Stew", "season": "summer" }],
            "summer_recipes": [{ "name": "Salad" }]
        });
        let catalog = RecipeCatalog::from_value(&value).unwrap();

        assert_eq!(catalog.find("Stew").unwrap().season, Season::Winter);
        assert_eq!(catalog.find("Salad").unwrap().season, Season::Summer);
    }

    #[test]
    fn test_from_value_missing_collection() {
        let catalog = RecipeCatalog::from_value(&json!({ "winter_recipes": [] })).unwrap();
        assert!(catalog.is_empty());
        assert!(RecipeCatalog::from_value(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_from_value_skips_unreadable_recipes() {
        let value = json!({
            "winter_recipes": [
                { "name": "Stew", "tags": null },
                { "tags": ["no name"] },
                { "name": "Hash", "recipe_number": 2.5 }
            ],
            "summer_recipes": null
        });
        let catalog = RecipeCatalog::from_value(&value).unwrap();

        assert_eq!(catalog.len(), 2);
        assert!(catalog.find("Stew").is_some());
        assert!(catalog.find("Hash").is_some());
        assert!(catalog.recipes(Season::Summer).is_empty());
    }

    #[test]
    fn test_upsert_replaces_within_season() {
        let mut catalog = sample();
        let spicier = RecipeRecord::new("Chili", Season::Summer).with_section("Grill");

        let replaced = catalog.upsert(spicier.clone()).unwrap();
        assert_eq!(replaced.section.as_deref(), Some("Mains"));
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.recipes(Season::Summer)[1], spicier);
        assert_eq!(catalog.find("Chili").unwrap().section.as_deref(), Some("Mains"));

        assert!(catalog
            .upsert(RecipeRecord::new("Ratatouille", Season::Summer))
            .is_none());
        assert_eq!(catalog.recipes(Season::Summer).len(), 3);
    }

    #[test]
    fn test_remove_only_touches_one_season() {
        let mut catalog = sample();

        let removed = catalog.remove(Season::Winter, "Chili").unwrap();
        assert_eq!(removed.season, Season::Winter);
        assert_eq!(catalog.find("Chili").unwrap().season, Season::Summer);
        assert!(catalog.remove(Season::Winter, "Chili").is_none());
        assert!(catalog.remove(Season::Summer, "chili").is_none());
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_find_is_exact_and_prefers_winter() {
        let catalog = sample();
        assert_eq!(catalog.find("Chili").unwrap().season, Season::Winter);
        assert!(catalog.find("chili").is_none());
        assert!(catalog.find("Chili ").is_none());
    }

    #[test]
    fn test_sections() {
        let catalog = sample();
        assert_eq!(catalog.sections(Season::Winter), vec!["Mains", "Soups"]);
        assert_eq!(catalog.sections(Season::Summer), vec!["Mains", "Soups"]);
    }

    #[test]
    fn test_filter() {
        let catalog = sample();
        let names = |v: Vec<&RecipeRecord>| v.iter().map(|r| r.name.clone()).collect::<Vec<_>>();

        assert_eq!(
            names(catalog.filter(Some(Season::Summer), Some("Soups"), "")),
            vec!["Gazpacho"]
        );
        assert_eq!(
            names(catalog.filter(None, None, "SOUP")),
            vec!["Leek Soup"]
        );
        assert_eq!(catalog.filter(None, None, "").len(), 4);
    }

    #[test]
    fn test_load_latest_prefers_newest_snapshot() {
        let store = MemoryBlobStore::new()
            .with_blob(
                "recipes_2025-01-01.json",
                json!({ "winter_recipes": [{ "name": "Old" }] }),
            )
            .with_blob(
                "recipes_2025-02-01.json",
                json!({ "winter_recipes": [{ "name": "New" }] }),
            )
            .with_blob(BUNDLED_RECIPES, json!({ "winter_recipes": [{ "name": "Bundled" }] }));

        let (catalog, source) = RecipeCatalog::load_latest(&store).unwrap();
        assert!(catalog.find("New").is_some());
        assert_eq!(source.as_deref(), Some("recipes_2025-02-01.json"));
    }

    #[test]
    fn test_load_latest_skips_unusable_and_falls_back() {
        let store = MemoryBlobStore::new()
            .with_blob("recipes_2025-02-01.json", json!("not a catalog"))
            .with_blob(BUNDLED_RECIPES, json!({ "summer_recipes": [{ "name": "Bundled" }] }));

        let (catalog, source) = RecipeCatalog::load_latest(&store).unwrap();
        assert!(catalog.find("Bundled").is_some());
        assert_eq!(source.as_deref(), Some(BUNDLED_RECIPES));
    }

    #[test]
    fn test_load_latest_empty_store() {
        let store = MemoryBlobStore::new();
        let (catalog, source) = RecipeCatalog::load_latest(&store).unwrap();
        assert!(catalog.is_empty());
        assert!(source.is_none());
    }

    #[test]
    fn test_save_writes_dated_snapshot() {
        let store = MemoryBlobStore::new();
        let date = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();

        let name = sample().save(&store, date).unwrap();
        assert_eq!(name, "recipes_2025-03-04.json");

        let reloaded = RecipeCatalog::from_value(&store.get(&name).unwrap()).unwrap();
        assert_eq!(reloaded, sample());
    }
}
