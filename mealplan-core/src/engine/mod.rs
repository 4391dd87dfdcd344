//! Sync engine: the active plan, its debounced saves and file switching.

mod debounce;
mod error;
mod plan_engine;
mod state;

pub use debounce::{DebounceTimer, DEFAULT_DEBOUNCE};
pub use error::EngineError;
pub use plan_engine::{DeleteConfirmed, EngineOptions, PlanEngine};
pub use state::SyncState;
