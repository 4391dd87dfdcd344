use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use super::day::Day;
use super::recipe::RecipeRecord;

/// The meal slots every day of a plan carries, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanLayout {
    meals: Vec<String>,
}

impl PlanLayout {
    /// Builds a layout from meal names. Blank and repeated names are dropped;
    /// an empty list falls back to the default layout.
    pub fn new<I, T>(meals: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for meal in meals {
            let meal = meal.into().trim().to_string();
            if !meal.is_empty() && !unique.contains(&meal) {
                unique.push(meal);
            }
        }
        if unique.is_empty() {
            return Self::default();
        }
        Self { meals: unique }
    }

    pub fn meals(&self) -> &[String] {
        &self.meals
    }

    /// Finds the configured spelling of `meal`, ignoring case.
    pub fn resolve(&self, meal: &str) -> Option<&str> {
        self.meals
            .iter()
            .find(|m| m.eq_ignore_ascii_case(meal.trim()))
            .map(String::as_str)
    }
}

impl Default for PlanLayout {
    fn default() -> Self {
        Self {
            meals: vec!["Lunch".to_string(), "Dinner".to_string()],
        }
    }
}

/// One (day, meal) cell.
///
/// A planned slot holds a copy of the recipe taken when it was picked, not a
/// reference into the catalog. The copy stays readable after the catalog
/// entry is edited or removed; only reconciliation refreshes it.
///
/// A stored cell that is not a readable recipe is kept verbatim as
/// `Unreadable` and written back unchanged. It counts as occupied, so
/// auto-fill and reconciliation leave it alone.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MealSlot {
    #[default]
    Empty,
    Planned(RecipeRecord),
    Unreadable(Value),
}

impl MealSlot {
    /// Reads one stored cell. `null` is empty.
    pub fn from_stored(value: &Value) -> Self {
        if value.is_null() {
            return MealSlot::Empty;
        }
        match RecipeRecord::deserialize(value) {
            Ok(recipe) => MealSlot::Planned(recipe),
            Err(_) => MealSlot::Unreadable(value.clone()),
        }
    }

    pub fn recipe(&self) -> Option<&RecipeRecord> {
        match self {
            MealSlot::Planned(recipe) => Some(recipe),
            MealSlot::Empty | MealSlot::Unreadable(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, MealSlot::Empty)
    }
}

impl From<Option<RecipeRecord>> for MealSlot {
    fn from(recipe: Option<RecipeRecord>) -> Self {
        match recipe {
            Some(recipe) => MealSlot::Planned(recipe),
            None => MealSlot::Empty,
        }
    }
}

impl Serialize for MealSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MealSlot::Empty => serializer.serialize_none(),
            MealSlot::Planned(recipe) => recipe.serialize(serializer),
            MealSlot::Unreadable(raw) => raw.serialize(serializer),
        }
    }
}

/// A week of meals: every day of the week crossed with every meal of the
/// layout. Every cell always exists; unplanned cells are `MealSlot::Empty`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRecord {
    meals: Vec<String>,
    /// Each row is index-aligned with `meals`.
    cells: BTreeMap<Day, Vec<MealSlot>>,
}

impl PlanRecord {
    pub fn empty(layout: &PlanLayout) -> Self {
        let meals = layout.meals().to_vec();
        let cells = Day::ALL
            .into_iter()
            .map(|day| (day, vec![MealSlot::Empty; meals.len()]))
            .collect();
        Self { meals, cells }
    }

    pub fn meals(&self) -> &[String] {
        &self.meals
    }

    pub fn get(&self, day: Day, meal: &str) -> Option<&MealSlot> {
        let idx = self.meals.iter().position(|m| m == meal)?;
        self.cells.get(&day).and_then(|row| row.get(idx))
    }

    pub fn slot_mut(&mut self, day: Day, meal: &str) -> Option<&mut MealSlot> {
        let idx = self.meals.iter().position(|m| m == meal)?;
        self.cells.get_mut(&day).and_then(|row| row.get_mut(idx))
    }

    /// All cells, Monday first, meals in layout order.
    pub fn slots(&self) -> impl Iterator<Item = (Day, &str, &MealSlot)> + '_ {
        let meals = &self.meals;
        self.cells.iter().flat_map(move |(day, row)| {
            let day = *day;
            row.iter()
                .zip(meals.iter())
                .map(move |(slot, meal)| (day, meal.as_str(), slot))
        })
    }

    pub fn slots_mut(&mut self) -> impl Iterator<Item = (Day, &str, &mut MealSlot)> + '_ {
        let meals = &self.meals;
        self.cells.iter_mut().flat_map(move |(day, row)| {
            let day = *day;
            row.iter_mut()
                .zip(meals.iter())
                .map(move |(slot, meal)| (day, meal.as_str(), slot))
        })
    }

    pub fn filled_count(&self, day: Day) -> usize {
        self.cells
            .get(&day)
            .map(|row| row.iter().filter(|slot| !slot.is_empty()).count())
            .unwrap_or(0)
    }

    pub fn is_blank(&self) -> bool {
        self.slots().all(|(_, _, slot)| slot.is_empty())
    }
}

/// Stored shape: `{ "Monday": { "Lunch": {..} | null, .. }, .. }`.
impl Serialize for PlanRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Row<'a>(&'a [String], &'a [MealSlot]);

        impl Serialize for Row<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (meal, slot) in self.0.iter().zip(self.1) {
                    map.serialize_entry(meal, slot)?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (day, row) in &self.cells {
            map.serialize_entry(day.as_str(), &Row(&self.meals, row))?;
        }
        map.end()
    }
}

/// Builds a complete plan from whatever was stored.
///
/// Cells missing from `raw` and cells holding `null` come out empty. Cells
/// that are not a readable recipe are kept as `MealSlot::Unreadable`. Keys
/// outside the layout (such as a meal slot that has since been removed)
/// are dropped. `None` or a non-object yields an all-empty plan. Never
/// fails.
pub fn normalize(raw: Option<&Value>, layout: &PlanLayout) -> PlanRecord {
    let mut plan = PlanRecord::empty(layout);
    let Some(Value::Object(days)) = raw else {
        return plan;
    };

    for (day, meal, slot) in plan.slots_mut() {
        let Some(value) = days.get(day.as_str()).and_then(|row| row.get(meal)) else {
            continue;
        };
        *slot = MealSlot::from_stored(value);
        if let MealSlot::Unreadable(_) = slot {
            tracing::warn!("Keeping unreadable {} {} slot as stored", day, meal);
        }
    }

    plan
}

impl fmt::Display for PlanRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (day, row)) in self.cells.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{} ({}/{})", day, self.filled_count(*day), row.len())?;
            for (meal, slot) in self.meals.iter().zip(row) {
                let name = match slot {
                    MealSlot::Empty => "-",
                    MealSlot::Planned(recipe) => recipe.name.as_str(),
                    MealSlot::Unreadable(_) => "(unreadable)",
                };
                writeln!(f, "  {:10} {}", meal, name)?;
            }
        }
        Ok(())
    }
}
