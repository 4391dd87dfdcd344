//! Filling empty slots with random recipes that match per-slot filters.

use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::RecipeCatalog;
use crate::models::{Day, MealSlot, PlanRecord, RecipeRecord, Season};

/// Picker criteria for one (day, meal) slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotFilter {
    pub season: Season,
    pub sections: BTreeSet<String>,
    pub tags: BTreeSet<String>,
    pub search_text: String,
}

impl SlotFilter {
    pub fn new(season: Season) -> Self {
        Self {
            season,
            ..Self::default()
        }
    }

    pub fn with_sections<I, T>(mut self, sections: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.sections = sections.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    /// Without a section there is nothing to auto-fill from.
    pub fn is_active(&self) -> bool {
        !self.sections.is_empty()
    }

    pub fn matches(&self, recipe: &RecipeRecord) -> bool {
        let in_section = recipe
            .section
            .as_ref()
            .is_some_and(|s| self.sections.contains(s));
        let tagged = self.tags.is_empty() || recipe.shares_tag(&self.tags);
        let needle = self.search_text.trim().to_lowercase();
        let named = needle.is_empty() || recipe.name.to_lowercase().contains(&needle);

        recipe.season == self.season && in_section && tagged && named
    }

    /// Matching recipes from the filter's season.
    pub fn candidates<'a>(&self, catalog: &'a RecipeCatalog) -> Vec<&'a RecipeRecord> {
        catalog
            .recipes(self.season)
            .iter()
            .filter(|r| self.matches(r))
            .collect()
    }
}

/// Per-slot filters. Kept in memory only; never written to disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    filters: BTreeMap<Day, BTreeMap<String, SlotFilter>>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, day: Day, meal: impl Into<String>, filter: SlotFilter) {
        self.filters
            .entry(day)
            .or_default()
            .insert(meal.into(), filter);
    }

    pub fn get(&self, day: Day, meal: &str) -> Option<&SlotFilter> {
        self.filters.get(&day).and_then(|row| row.get(meal))
    }

    pub fn clear(&mut self, day: Day, meal: &str) -> Option<SlotFilter> {
        self.filters.get_mut(&day).and_then(|row| row.remove(meal))
    }

    pub fn is_empty(&self) -> bool {
        self.filters.values().all(BTreeMap::is_empty)
    }
}

/// Fills every empty slot that has an active filter with a uniformly random
/// matching recipe. Planned slots are never touched.
///
/// Returns the slots that were filled.
pub fn auto_fill<R: Rng + ?Sized>(
    plan: &mut PlanRecord,
    catalog: &RecipeCatalog,
    filters: &FilterState,
    rng: &mut R,
) -> Vec<(Day, String)> {
    let mut filled = Vec::new();

    for (day, meal, slot) in plan.slots_mut() {
        if !slot.is_empty() {
            continue;
        }
        let Some(filter) = filters.get(day, meal).filter(|f| f.is_active()) else {
            continue;
        };

        let candidates = filter.candidates(catalog);
        match candidates.choose(rng) {
            Some(recipe) => {
                tracing::debug!("Auto-filled {} {} with {}", day, meal, recipe.name);
                *slot = MealSlot::Planned((*recipe).clone());
                filled.push((day, meal.to_string()));
            }
            None => tracing::debug!("No recipe matches the filter for {} {}", day, meal),
        }
    }

    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlanLayout;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn catalog() -> RecipeCatalog {
        RecipeCatalog::new(
            vec![
                RecipeRecord::new("Chili", Season::Winter)
                    .with_section("Mains")
                    .with_tags(["spicy"]),
                RecipeRecord::new("Beef Stew", Season::Winter)
                    .with_section("Mains")
                    .with_tags(["slow"]),
                RecipeRecord::new("Leek Soup", Season::Winter).with_section("Soups"),
            ],
            vec![RecipeRecord::new("Gazpacho", Season::Summer).with_section("Soups")],
        )
    }

    fn filled_name(plan: &PlanRecord, day: Day, meal: &str) -> Option<String> {
        plan.get(day, meal)
            .and_then(MealSlot::recipe)
            .map(|r| r.name.clone())
    }

    #[test]
    fn test_no_section_filter_leaves_slot_empty() {
        let mut plan = PlanRecord::empty(&PlanLayout::default());
        let mut filters = FilterState::new();
        filters.set(
            Day::Monday,
            "Dinner",
            SlotFilter::new(Season::Winter).with_tags(["spicy"]),
        );

        let filled = auto_fill(&mut plan, &catalog(), &filters, &mut StdRng::seed_from_u64(1));
        assert!(filled.is_empty());
        assert!(plan.is_blank());
    }

    #[test]
    fn test_fills_from_matching_pool() {
        let mut plan = PlanRecord::empty(&PlanLayout::default());
        let mut filters = FilterState::new();
        filters.set(
            Day::Monday,
            "Dinner",
            SlotFilter::new(Season::Winter)
                .with_sections(["Mains"])
                .with_tags(["spicy", "vegan"]),
        );
        filters.set(
            Day::Tuesday,
            "Lunch",
            SlotFilter::new(Season::Summer).with_sections(["Soups"]),
        );

        let filled = auto_fill(&mut plan, &catalog(), &filters, &mut StdRng::seed_from_u64(2));

        assert_eq!(filled.len(), 2);
        assert_eq!(filled_name(&plan, Day::Monday, "Dinner").as_deref(), Some("Chili"));
        assert_eq!(
            filled_name(&plan, Day::Tuesday, "Lunch").as_deref(),
            Some("Gazpacho")
        );
    }

    #[test]
    fn test_search_text_is_case_insensitive() {
        let mut plan = PlanRecord::empty(&PlanLayout::default());
        let mut filters = FilterState::new();
        filters.set(
            Day::Friday,
            "Lunch",
            SlotFilter::new(Season::Winter)
                .with_sections(["Mains", "Soups"])
                .with_search("STEW"),
        );

        auto_fill(&mut plan, &catalog(), &filters, &mut StdRng::seed_from_u64(3));
        assert_eq!(
            filled_name(&plan, Day::Friday, "Lunch").as_deref(),
            Some("Beef Stew")
        );
    }

    #[test]
    fn test_empty_pool_leaves_slot_empty() {
        let mut plan = PlanRecord::empty(&PlanLayout::default());
        let mut filters = FilterState::new();
        filters.set(
            Day::Monday,
            "Lunch",
            SlotFilter::new(Season::Summer).with_sections(["Mains"]),
        );

        let filled = auto_fill(&mut plan, &catalog(), &filters, &mut StdRng::seed_from_u64(4));
        assert!(filled.is_empty());
    }

    #[test]
    fn test_never_overwrites_planned_slot() {
        let mut plan = PlanRecord::empty(&PlanLayout::default());
        let mine = RecipeRecord::new("Leftovers", Season::Winter);
        *plan.slot_mut(Day::Monday, "Dinner").unwrap() = MealSlot::Planned(mine.clone());

        let mut filters = FilterState::new();
        filters.set(
            Day::Monday,
            "Dinner",
            SlotFilter::new(Season::Winter).with_sections(["Mains"]),
        );

        let filled = auto_fill(&mut plan, &catalog(), &filters, &mut StdRng::seed_from_u64(5));
        assert!(filled.is_empty());
        assert_eq!(plan.get(Day::Monday, "Dinner").and_then(MealSlot::recipe), Some(&mine));
    }

    #[test]
    fn test_draw_is_random_not_first_declared() {
        let mut seen = BTreeSet::new();
        let mut filters = FilterState::new();
        filters.set(
            Day::Monday,
            "Dinner",
            SlotFilter::new(Season::Winter).with_sections(["Mains"]),
        );

        for seed in 0..64 {
            let mut plan = PlanRecord::empty(&PlanLayout::default());
            auto_fill(&mut plan, &catalog(), &filters, &mut StdRng::seed_from_u64(seed));
            seen.extend(filled_name(&plan, Day::Monday, "Dinner"));
        }

        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_filter_state_set_get_clear() {
        let mut filters = FilterState::new();
        assert!(filters.is_empty());

        let filter = SlotFilter::new(Season::Summer).with_sections(["Soups"]);
        filters.set(Day::Sunday, "Lunch", filter.clone());
        assert_eq!(filters.get(Day::Sunday, "Lunch"), Some(&filter));
        assert!(filters.get(Day::Sunday, "Dinner").is_none());

        assert_eq!(filters.clear(Day::Sunday, "Lunch"), Some(filter));
        assert!(filters.is_empty());
    }
}
