//! Refreshing recipe copies held in plan slots.
//!
//! Slots cache a copy of the recipe they were planned with. The cache is
//! invalidated by hand: after the catalog changes, each planned slot is
//! looked up by exact name and overwritten with the current record. Slots
//! with no match (the recipe was renamed or removed) keep their old copy,
//! so a plan never silently loses what was on it.

use crate::catalog::RecipeCatalog;
use crate::models::{MealSlot, PlanRecord, RecipeRecord};

/// Where fresh copies of recipes come from.
pub trait RecipeSource {
    fn lookup(&self, name: &str) -> Option<&RecipeRecord>;
}

impl RecipeSource for RecipeCatalog {
    fn lookup(&self, name: &str) -> Option<&RecipeRecord> {
        self.find(name)
    }
}

/// What a reconciliation pass did to one plan.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Slots whose copy differed from the catalog and was replaced.
    pub refreshed: usize,
    /// Names of planned recipes the catalog no longer has.
    pub orphaned: Vec<String>,
}

impl ReconcileReport {
    pub fn changed(&self) -> bool {
        self.refreshed > 0
    }
}

/// Brings every planned slot of `plan` up to date with `source`.
///
/// Running it twice against the same source changes nothing the second
/// time.
pub fn reconcile(plan: &mut PlanRecord, source: &dyn RecipeSource) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for (day, meal, slot) in plan.slots_mut() {
        let MealSlot::Planned(stale) = slot else {
            continue;
        };
        match source.lookup(&stale.name) {
            Some(fresh) if fresh != stale => {
                tracing::debug!("Refreshed {} on {} {}", stale.name, day, meal);
                *stale = fresh.clone();
                report.refreshed += 1;
            }
            Some(_) => {}
            None => {
                tracing::warn!(
                    "{} on {} {} is no longer in the catalog; keeping the old copy",
                    stale.name,
                    day,
                    meal
                );
                report.orphaned.push(stale.name.clone());
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Day, Ingredient, PlanLayout, Season};

    fn planned(plan: &mut PlanRecord, day: Day, meal: &str, recipe: RecipeRecord) {
        *plan.slot_mut(day, meal).unwrap() = MealSlot::Planned(recipe);
    }

    fn recipe_at<'a>(plan: &'a PlanRecord, day: Day, meal: &str) -> &'a RecipeRecord {
        plan.get(day, meal).and_then(MealSlot::recipe).unwrap()
    }

    #[test]
    fn test_refreshes_stale_copy_from_winter_collection() {
        let fresh = RecipeRecord::new("Chili", Season::Winter).with_tags(["spicy"]);
        let catalog = RecipeCatalog::new(vec![fresh.clone()], vec![]);

        let mut plan = PlanRecord::empty(&PlanLayout::default());
        planned(
            &mut plan,
            Day::Monday,
            "Dinner",
            RecipeRecord::new("Chili", Season::Winter),
        );

        let report = reconcile(&mut plan, &catalog);
        assert_eq!(report.refreshed, 1);
        assert!(report.orphaned.is_empty());
        assert_eq!(recipe_at(&plan, Day::Monday, "Dinner"), &fresh);
    }

    #[test]
    fn test_finds_recipe_in_summer_collection() {
        let fresh = RecipeRecord::new("Gazpacho", Season::Summer)
            .with_ingredients(vec![Ingredient::new("tomatoes")]);
        let catalog = RecipeCatalog::new(vec![], vec![fresh.clone()]);

        let mut plan = PlanRecord::empty(&PlanLayout::default());
        planned(
            &mut plan,
            Day::Friday,
            "Lunch",
            RecipeRecord::new("Gazpacho", Season::Winter),
        );

        reconcile(&mut plan, &catalog);
        assert_eq!(recipe_at(&plan, Day::Friday, "Lunch"), &fresh);
    }

    #[test]
    fn test_missing_recipe_is_left_alone() {
        let catalog = RecipeCatalog::new(vec![RecipeRecord::new("Chili ", Season::Winter)], vec![]);
        let old = RecipeRecord::new("Chili", Season::Winter).with_link("https://example.com");

        let mut plan = PlanRecord::empty(&PlanLayout::default());
        planned(&mut plan, Day::Tuesday, "Dinner", old.clone());
        let before = plan.clone();

        let report = reconcile(&mut plan, &catalog);
        assert_eq!(plan, before);
        assert!(!report.changed());
        assert_eq!(report.orphaned, vec!["Chili".to_string()]);
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let catalog = RecipeCatalog::new(
            vec![RecipeRecord::new("chili", Season::Winter).with_tags(["x"])],
            vec![],
        );
        let mut plan = PlanRecord::empty(&PlanLayout::default());
        planned(
            &mut plan,
            Day::Monday,
            "Lunch",
            RecipeRecord::new("Chili", Season::Winter),
        );

        reconcile(&mut plan, &catalog);
        assert!(recipe_at(&plan, Day::Monday, "Lunch").tags.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let catalog = RecipeCatalog::new(
            vec![RecipeRecord::new("Stew", Season::Winter).with_section("Mains")],
            vec![RecipeRecord::new("Salad", Season::Summer).with_tags(["quick"])],
        );
        let mut plan = PlanRecord::empty(&PlanLayout::default());
        planned(&mut plan, Day::Monday, "Lunch", RecipeRecord::new("Stew", Season::Winter));
        planned(&mut plan, Day::Sunday, "Dinner", RecipeRecord::new("Salad", Season::Winter));
        planned(&mut plan, Day::Sunday, "Lunch", RecipeRecord::new("Gone", Season::Winter));

        let first = reconcile(&mut plan, &catalog);
        let once = plan.clone();
        let second = reconcile(&mut plan, &catalog);

        assert_eq!(first.refreshed, 2);
        assert_eq!(second.refreshed, 0);
        assert_eq!(plan, once);
    }

    #[test]
    fn test_empty_slots_untouched() {
        let catalog = RecipeCatalog::new(vec![RecipeRecord::new("Stew", Season::Winter)], vec![]);
        let mut plan = PlanRecord::empty(&PlanLayout::default());

        let report = reconcile(&mut plan, &catalog);
        assert_eq!(report, ReconcileReport::default());
        assert!(plan.is_blank());
    }
}
