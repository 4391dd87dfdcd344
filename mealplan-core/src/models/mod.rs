mod day;
mod ingredient;
mod plan;
mod recipe;
mod season;

pub use day::Day;
pub use ingredient::Ingredient;
pub use plan::{normalize, MealSlot, PlanLayout, PlanRecord};
pub use recipe::RecipeRecord;
pub use season::Season;
