//! Persistence layer for the document store

use crate::error::StorageError;
use crate::store::{Document, DocumentStore};
use crate::types::CollectionId;
use sled::transaction::{ConflictableTransactionResult, TransactionError, Transactional};
use std::io;
use std::path::Path;

/// Prefix separating collection trees from other trees in the same database.
const COLLECTION_TREE_PREFIX: &str = "col/";

/// Sled-based implementation of `DocumentStore`
///
/// Each collection is its own sled tree; documents are stored as JSON bytes keyed by
/// certification number.
#[derive(Clone)]
pub struct SledDocumentStore {
    db: sled::Db,
}

impl SledDocumentStore {
    /// Open (or create) a store at the given directory.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(|e| to_storage_error(e, "open", ""))?;
        Ok(Self { db })
    }

    /// Wrap an already opened database, e.g. one shared with the merge journal.
    pub fn from_db(db: sled::Db) -> Self {
        Self { db }
    }

    /// Get the underlying sled database (for advanced operations)
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db
            .flush()
            .map_err(|e| to_storage_error(e, "flush", ""))?;
        Ok(())
    }

    /// Open the collection's tree, creating it. Only write paths call this.
    fn tree(&self, collection: &CollectionId, operation: &'static str) -> Result<sled::Tree, StorageError> {
        self.db
            .open_tree(tree_name(collection))
            .map_err(|e| to_storage_error(e, operation, collection.as_str()))
    }

    /// The collection's tree if it was ever written; reads never create one.
    fn existing_tree(
        &self,
        collection: &CollectionId,
        operation: &'static str,
    ) -> Result<Option<sled::Tree>, StorageError> {
        let name = tree_name(collection);
        if !self.db.tree_names().iter().any(|n| n.as_ref() == name.as_bytes()) {
            return Ok(None);
        }
        self.tree(collection, operation).map(Some)
    }
}

impl DocumentStore for SledDocumentStore {
    fn list(&self, collection: &CollectionId) -> Result<Vec<Document>, StorageError> {
        let Some(tree) = self.existing_tree(collection, "read")? else {
            return Ok(Vec::new());
        };
        let mut documents = Vec::with_capacity(tree.len());
        for item in tree.iter() {
            let (key, value) = item.map_err(|e| to_storage_error(e, "read", collection.as_str()))?;
            let key = String::from_utf8_lossy(&key).into_owned();
            let body = decode(collection, &key, &value)?;
            documents.push(Document { key, body });
        }
        Ok(documents)
    }

    fn get(&self, collection: &CollectionId, key: &str) -> Result<Option<Document>, StorageError> {
        let Some(tree) = self.existing_tree(collection, "read")? else {
            return Ok(None);
        };
        match tree
            .get(key.as_bytes())
            .map_err(|e| to_storage_error(e, "read", collection.as_str()))?
        {
            Some(value) => Ok(Some(Document::new(key, decode(collection, key, &value)?))),
            None => Ok(None),
        }
    }

    fn put(&self, collection: &CollectionId, document: &Document) -> Result<(), StorageError> {
        let tree = self.tree(collection, "put")?;
        let value = encode(collection, document)?;
        tree.insert(document.key.as_bytes(), value)
            .map_err(|e| to_storage_error(e, "put", collection.as_str()))?;
        Ok(())
    }

    fn delete(&self, collection: &CollectionId, key: &str) -> Result<(), StorageError> {
        let Some(tree) = self.existing_tree(collection, "delete")? else {
            return Ok(());
        };
        tree.remove(key.as_bytes())
            .map_err(|e| to_storage_error(e, "delete", collection.as_str()))?;
        Ok(())
    }

    fn supports_atomic_transfer(&self) -> bool {
        true
    }

    fn transfer_atomic(
        &self,
        from: &CollectionId,
        to: &CollectionId,
        document: &Document,
    ) -> Result<(), StorageError> {
        if from == to {
            return Err(StorageError::Unsupported("transfer within a single collection"));
        }
        let from_tree = self.tree(from, "delete")?;
        let to_tree = self.tree(to, "put")?;
        let value = encode(to, document)?;
        let key = document.key.as_bytes();

        (&from_tree, &to_tree)
            .transaction(|(from_tx, to_tx)| -> ConflictableTransactionResult<(), ()> {
                to_tx.insert(key, value.clone())?;
                from_tx.remove(key)?;
                Ok(())
            })
            .map_err(|e| match e {
                TransactionError::Abort(()) => {
                    StorageError::Transient(format!("transfer of {} aborted", document.key))
                }
                TransactionError::Storage(e) => to_storage_error(e, "transfer", from.as_str()),
            })
    }
}

fn tree_name(collection: &CollectionId) -> String {
    format!("{}{}", COLLECTION_TREE_PREFIX, collection)
}

fn encode(collection: &CollectionId, document: &Document) -> Result<Vec<u8>, StorageError> {
    serde_json::to_vec(&document.body).map_err(|e| StorageError::InvalidDocument {
        collection: collection.to_string(),
        key: document.key.clone(),
        reason: format!("Failed to serialize document: {}", e),
    })
}

fn decode(collection: &CollectionId, key: &str, value: &[u8]) -> Result<serde_json::Value, StorageError> {
    serde_json::from_slice(value).map_err(|e| StorageError::InvalidDocument {
        collection: collection.to_string(),
        key: key.to_string(),
        reason: format!("Failed to deserialize document: {}", e),
    })
}

fn to_storage_error(err: sled::Error, operation: &'static str, collection: &str) -> StorageError {
    match err {
        sled::Error::Io(io_err) if io_err.kind() == io::ErrorKind::PermissionDenied => {
            StorageError::PermissionDenied {
                collection: collection.to_string(),
                operation,
            }
        }
        sled::Error::Io(io_err) => StorageError::IoError(io_err),
        other => StorageError::IoError(io::Error::new(
            io::ErrorKind::Other,
            format!("sled {} failed: {}", operation, other),
        )),
    }
}
