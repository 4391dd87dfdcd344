use thiserror::Error;

use crate::storage::StorageError;

/// Errors reported by [`super::PlanEngine`] operations.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Unknown meal '{0}'")]
    UnknownMeal(String),

    #[error("Plan file not found: {0}")]
    UnknownPlan(String),

    #[error("Cannot {0} while a save or switch is in progress")]
    Busy(&'static str),
}

impl EngineError {
    /// Whether the session should stop. Everything except an unreachable
    /// data directory can be retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Storage(e) if e.is_fatal())
    }
}
