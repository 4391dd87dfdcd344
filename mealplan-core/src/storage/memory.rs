//! In-memory blob store for tests: records every call and can be told to
//! fail writes.

use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use super::{BlobKind, BlobStore, StorageError};

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    List,
    Read(String),
    Write(String, Value),
    Delete(String),
}

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RefCell<BTreeMap<String, Value>>,
    ops: RefCell<Vec<Op>>,
    fail_writes: Cell<bool>,
    offline: Cell<bool>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(self, name: &str, value: Value) -> Self {
        self.blobs.borrow_mut().insert(name.to_string(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.blobs.borrow().get(name).cloned()
    }

    pub fn ops(&self) -> Vec<Op> {
        self.ops.borrow().clone()
    }

    pub fn clear_ops(&self) {
        self.ops.borrow_mut().clear();
    }

    pub fn writes(&self) -> Vec<String> {
        self.ops
            .borrow()
            .iter()
            .filter_map(|op| match op {
                Op::Write(name, _) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    fn check_online(&self) -> Result<(), StorageError> {
        if self.offline.get() {
            return Err(StorageError::Unavailable {
                path: PathBuf::from("memory"),
                source: io::Error::new(io::ErrorKind::NotConnected, "offline"),
            });
        }
        Ok(())
    }
}

impl BlobStore for MemoryBlobStore {
    fn list(&self, kind: BlobKind) -> Result<Vec<String>, StorageError> {
        self.check_online()?;
        self.ops.borrow_mut().push(Op::List);
        // Oldest first, the opposite of what callers display.
        Ok(self
            .blobs
            .borrow()
            .keys()
            .filter(|name| kind.matches(name))
            .cloned()
            .collect())
    }

    fn read(&self, name: &str) -> Result<Option<Value>, StorageError> {
        self.check_online()?;
        self.ops.borrow_mut().push(Op::Read(name.to_string()));
        Ok(self.blobs.borrow().get(name).cloned())
    }

    fn write(&self, name: &str, value: &Value) -> Result<(), StorageError> {
        self.check_online()?;
        if self.fail_writes.get() {
            return Err(StorageError::WriteFailed {
                name: name.to_string(),
                source: io::Error::other("disk full"),
            });
        }
        self.ops
            .borrow_mut()
            .push(Op::Write(name.to_string(), value.clone()));
        self.blobs
            .borrow_mut()
            .insert(name.to_string(), value.clone());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), StorageError> {
        self.check_online()?;
        self.ops.borrow_mut().push(Op::Delete(name.to_string()));
        match self.blobs.borrow_mut().remove(name) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(name.to_string())),
        }
    }
}
