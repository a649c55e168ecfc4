//! In-memory document backend with fault injection.
//!
//! Backs tests and dry runs. A [`FaultPlan`] can make reads or writes of a
//! collection fail with a permission error, or make `put` / `delete` of one key fail
//! a bounded number of times, so partial-failure and retry paths can be driven
//! deterministically.

use crate::error::StorageError;
use crate::store::{Document, DocumentStore};
use crate::types::CollectionId;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

type Collections = BTreeMap<CollectionId, BTreeMap<String, Value>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum WriteOp {
    Put,
    Delete,
}

impl WriteOp {
    fn as_str(self) -> &'static str {
        match self {
            WriteOp::Put => "put",
            WriteOp::Delete => "delete",
        }
    }
}

#[derive(Debug, Default)]
struct FaultState {
    denied_reads: HashSet<CollectionId>,
    denied_writes: HashSet<CollectionId>,
    /// Remaining injected failures per (op, collection, key); `None` fails forever.
    key_failures: HashMap<(WriteOp, CollectionId, String), Option<usize>>,
}

/// Injected failures for a [`MemoryDocumentStore`].
#[derive(Debug, Default)]
pub struct FaultPlan {
    state: Mutex<FaultState>,
}

impl FaultPlan {
    /// Reads of `collection` fail with `PermissionDenied`.
    pub fn deny_reads(&self, collection: &CollectionId) {
        self.state.lock().denied_reads.insert(collection.clone());
    }

    /// Writes to `collection` fail with `PermissionDenied`.
    pub fn deny_writes(&self, collection: &CollectionId) {
        self.state.lock().denied_writes.insert(collection.clone());
    }

    /// Every `put` of `key` into `collection` fails with a transient error.
    pub fn fail_put(&self, collection: &CollectionId, key: &str) {
        self.insert(WriteOp::Put, collection, key, None);
    }

    /// Every `delete` of `key` from `collection` fails with a transient error.
    pub fn fail_delete(&self, collection: &CollectionId, key: &str) {
        self.insert(WriteOp::Delete, collection, key, None);
    }

    /// The next `times` deletes of `key` from `collection` fail, later ones succeed.
    pub fn fail_delete_times(&self, collection: &CollectionId, key: &str, times: usize) {
        self.insert(WriteOp::Delete, collection, key, Some(times));
    }

    fn insert(&self, op: WriteOp, collection: &CollectionId, key: &str, times: Option<usize>) {
        self.state
            .lock()
            .key_failures
            .insert((op, collection.clone(), key.to_string()), times);
    }

    fn check_read(&self, collection: &CollectionId) -> Result<(), StorageError> {
        if self.state.lock().denied_reads.contains(collection) {
            return Err(StorageError::PermissionDenied {
                collection: collection.to_string(),
                operation: "read",
            });
        }
        Ok(())
    }

    fn check_write(&self, op: WriteOp, collection: &CollectionId, key: &str) -> Result<(), StorageError> {
        let mut state = self.state.lock();
        if state.denied_writes.contains(collection) {
            return Err(StorageError::PermissionDenied {
                collection: collection.to_string(),
                operation: op.as_str(),
            });
        }
        let slot = (op, collection.clone(), key.to_string());
        let fail = match state.key_failures.get_mut(&slot) {
            None => false,
            Some(None) => true,
            Some(Some(0)) => false,
            Some(Some(remaining)) => {
                *remaining -= 1;
                true
            }
        };
        if fail {
            return Err(StorageError::Transient(format!(
                "injected {} failure for {}/{}",
                op.as_str(),
                collection,
                key
            )));
        }
        Ok(())
    }
}

/// `DocumentStore` held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<Collections>,
    faults: FaultPlan,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw document, bypassing any injected faults.
    pub fn seed(&self, collection: &CollectionId, key: &str, body: Value) {
        self.collections
            .write()
            .entry(collection.clone())
            .or_default()
            .insert(key.to_string(), body);
    }

    pub fn faults(&self) -> &FaultPlan {
        &self.faults
    }

    /// Keys of a collection in byte order, bypassing faults.
    pub fn keys(&self, collection: &CollectionId) -> Vec<String> {
        self.collections
            .read()
            .get(collection)
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self, collection: &CollectionId) -> usize {
        self.collections
            .read()
            .get(collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &CollectionId) -> bool {
        self.len(collection) == 0
    }

    /// Raw stored body of one document, bypassing faults.
    pub fn raw(&self, collection: &CollectionId, key: &str) -> Option<Value> {
        self.collections
            .read()
            .get(collection)
            .and_then(|docs| docs.get(key).cloned())
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn list(&self, collection: &CollectionId) -> Result<Vec<Document>, StorageError> {
        self.faults.check_read(collection)?;
        Ok(self
            .collections
            .read()
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(key, body)| Document::new(key.clone(), body.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get(&self, collection: &CollectionId, key: &str) -> Result<Option<Document>, StorageError> {
        self.faults.check_read(collection)?;
        Ok(self.raw(collection, key).map(|body| Document::new(key, body)))
    }

    fn put(&self, collection: &CollectionId, document: &Document) -> Result<(), StorageError> {
        self.faults.check_write(WriteOp::Put, collection, &document.key)?;
        self.seed(collection, &document.key, document.body.clone());
        Ok(())
    }

    fn delete(&self, collection: &CollectionId, key: &str) -> Result<(), StorageError> {
        self.faults.check_write(WriteOp::Delete, collection, key)?;
        if let Some(docs) = self.collections.write().get_mut(collection) {
            docs.remove(key);
        }
        Ok(())
    }
}
