use serde_json::Value;
use std::fs;
use std::io;
use std::path::PathBuf;

use super::{BlobKind, BlobStore, StorageError};

const TMP_SUFFIX: &str = ".tmp";

/// Blob storage backed by a directory of JSON files.
#[derive(Clone, Debug)]
pub struct FsBlobStore {
    data_dir: PathBuf,
}

impl FsBlobStore {
    /// Creates a new storage instance rooted at `data_dir`.
    ///
    /// The directory is created on first write.
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Returns the full path for a blob.
    pub fn path(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    fn unavailable(&self, source: io::Error) -> StorageError {
        StorageError::Unavailable {
            path: self.data_dir.clone(),
            source,
        }
    }
}

fn parse_blob(name: &str, contents: &str) -> Result<Value, StorageError> {
    serde_json::from_str(contents).map_err(|source| StorageError::ReadMalformed {
        name: name.to_string(),
        source,
    })
}

impl BlobStore for FsBlobStore {
    fn list(&self, kind: BlobKind) -> Result<Vec<String>, StorageError> {
        let entries = match fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.unavailable(e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| self.unavailable(e))?;
            let path = entry.path();

            // Skip non-files
            if !path.is_file() {
                continue;
            }

            if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
                if kind.matches(name) {
                    names.push(name.to_string());
                }
            }
        }

        Ok(names)
    }

    fn read(&self, name: &str) -> Result<Option<Value>, StorageError> {
        let contents = match fs::read_to_string(self.path(name)) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                tracing::warn!("Ignoring {}: not valid UTF-8", name);
                return Ok(None);
            }
            Err(e) => return Err(self.unavailable(e)),
        };

        match parse_blob(name, &contents) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!("{}; treating as absent", e);
                Ok(None)
            }
        }
    }

    fn write(&self, name: &str, value: &Value) -> Result<(), StorageError> {
        // Ensure data directory exists
        fs::create_dir_all(&self.data_dir).map_err(|e| self.unavailable(e))?;

        let contents =
            serde_json::to_string_pretty(value).map_err(|source| StorageError::Serialize {
                name: name.to_string(),
                source,
            })?;

        // Write beside the target and rename so readers never see half a file.
        let path = self.path(name);
        let tmp = self.path(&format!("{}{}", name, TMP_SUFFIX));
        let write_failed = |source| StorageError::WriteFailed {
            name: name.to_string(),
            source,
        };
        fs::write(&tmp, contents).map_err(write_failed)?;
        fs::rename(&tmp, &path).map_err(write_failed)?;

        tracing::debug!("Wrote {}", path.display());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(name.to_string()))
            }
            Err(source) => Err(StorageError::WriteFailed {
                name: name.to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn test_store() -> (FsBlobStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(temp_dir.path().to_path_buf());
        (store, temp_dir)
    }

    #[test]
    fn test_read_missing_returns_none() {
        let (store, _temp) = test_store();
        assert!(store.read("MP_2025-01-01.json").unwrap().is_none());
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(temp_dir.path().join("not-yet"));
        assert!(store.list(BlobKind::Plans).unwrap().is_empty());
    }

    #[test]
    fn test_write_creates_directory_and_reads_back() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("data");
        let store = FsBlobStore::new(nested.clone());

        let value = json!({ "Monday": { "Lunch": null } });
        store.write("MP_2025-01-01.json", &value).unwrap();

        assert!(nested.join("MP_2025-01-01.json").exists());
        assert!(!nested.join("MP_2025-01-01.json.tmp").exists());
        assert_eq!(store.read("MP_2025-01-01.json").unwrap(), Some(value));
    }

    #[test]
    fn test_write_is_pretty_printed() {
        let (store, temp) = test_store();
        store
            .write("MP_2025-01-01.json", &json!({ "Monday": {} }))
            .unwrap();

        let contents = fs::read_to_string(temp.path().join("MP_2025-01-01.json")).unwrap();
        assert!(contents.contains('\n'));
    }

    #[test]
    fn test_malformed_reads_as_absent() {
        let (store, temp) = test_store();
        fs::write(temp.path().join("MP_2025-01-01.json"), "{ not json").unwrap();

        assert!(store.read("MP_2025-01-01.json").unwrap().is_none());
    }

    #[test]
    fn test_parse_blob_reports_malformed() {
        let err = parse_blob("MP_2025-01-01.json", "[1,").unwrap_err();
        assert!(matches!(err, StorageError::ReadMalformed { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_list_filters_by_kind() {
        let (store, temp) = test_store();
        for name in [
            "MP_2025-01-01.json",
            "MP_2025-01-01_1.json",
            "recipes_2025-01-01.json",
            "notes.txt",
        ] {
            fs::write(temp.path().join(name), "{}").unwrap();
        }
        fs::create_dir(temp.path().join("MP_2025-01-02.json")).unwrap();

        let mut plans = store.list(BlobKind::Plans).unwrap();
        plans.sort();
        assert_eq!(plans, vec!["MP_2025-01-01.json", "MP_2025-01-01_1.json"]);
        assert_eq!(
            store.list(BlobKind::Recipes).unwrap(),
            vec!["recipes_2025-01-01.json"]
        );
    }

    #[test]
    fn test_delete() {
        let (store, _temp) = test_store();
        store.write("MP_2025-01-01.json", &json!({})).unwrap();

        store.delete("MP_2025-01-01.json").unwrap();
        assert!(store.read("MP_2025-01-01.json").unwrap().is_none());

        let err = store.delete("MP_2025-01-01.json").unwrap_err();
        assert!(matches!(err, StorageError::NotFound(name) if name == "MP_2025-01-01.json"));
    }

    #[test]
    fn test_overwrite_existing() {
        let (store, _temp) = test_store();
        store.write("MP_2025-01-01.json", &json!({ "v": 1 })).unwrap();
        store.write("MP_2025-01-01.json", &json!({ "v": 2 })).unwrap();

        assert_eq!(
            store.read("MP_2025-01-01.json").unwrap(),
            Some(json!({ "v": 2 }))
        );
    }
}
