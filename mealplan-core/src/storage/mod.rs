//! Persistence boundary.
//!
//! Plans and recipe catalogs are stored as independent JSON blobs keyed by
//! filename. The engine only talks to storage through [`BlobStore`]; the
//! filesystem implementation keeps every blob as a pretty-printed file in
//! one data directory:
//!
//! ```text
//! ~/.local/share/mealplan/
//! ├── recipes_2025-01-01.json
//! ├── MP_2025-01-01.json
//! └── MP_2025-01-01_1.json
//! ```

mod error;
mod fs;
#[cfg(test)]
pub(crate) mod memory;

use serde_json::Value;

use crate::filename::{is_plan_filename, is_recipes_filename};

pub use error::StorageError;
pub use fs::FsBlobStore;

/// Families of blobs a listing can be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobKind {
    /// `MP_YYYY-MM-DD[_N].json`
    Plans,
    /// `recipes_YYYY-MM-DD.json`
    Recipes,
}

impl BlobKind {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            BlobKind::Plans => is_plan_filename(name),
            BlobKind::Recipes => is_recipes_filename(name),
        }
    }
}

/// Durable named-blob storage, single writer.
pub trait BlobStore {
    /// Names of stored blobs of `kind`, in no particular order.
    fn list(&self, kind: BlobKind) -> Result<Vec<String>, StorageError>;

    /// Reads a blob. Missing and unparseable blobs both read as `None`.
    fn read(&self, name: &str) -> Result<Option<Value>, StorageError>;

    /// Creates or replaces a blob.
    fn write(&self, name: &str, value: &Value) -> Result<(), StorageError>;

    /// Removes a blob. Fails with [`StorageError::NotFound`] if absent.
    fn delete(&self, name: &str) -> Result<(), StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_kind_matches() {
        assert!(BlobKind::Plans.matches("MP_2025-01-01_2.json"));
        assert!(!BlobKind::Plans.matches("recipes_2025-01-01.json"));
        assert!(BlobKind::Recipes.matches("recipes_2025-01-01.json"));
        assert!(!BlobKind::Recipes.matches("recipes.json"));
    }
}
