//! MealPlan Core Library
//!
//! Weekly meal plans stored as dated JSON files, a seasonal recipe catalog,
//! and the engine that keeps the plan being edited in step with its file.

pub mod autofill;
pub mod catalog;
pub mod clock;
pub mod engine;
pub mod filename;
pub mod models;
pub mod reconcile;
pub mod storage;

pub use autofill::{auto_fill, FilterState, SlotFilter};
pub use catalog::RecipeCatalog;
pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{
    DebounceTimer, DeleteConfirmed, EngineError, EngineOptions, PlanEngine, SyncState,
    DEFAULT_DEBOUNCE,
};
pub use models::{
    normalize, Day, Ingredient, MealSlot, PlanLayout, PlanRecord, RecipeRecord, Season,
};
pub use reconcile::{reconcile, ReconcileReport, RecipeSource};
pub use storage::{BlobKind, BlobStore, FsBlobStore, StorageError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
