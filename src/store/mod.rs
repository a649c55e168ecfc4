//! Record Store
//!
//! Uniform list/get/put/delete over named collections of keyed documents. A raw
//! [`DocumentStore`] backend does the I/O; [`StoreAccessor`] layers normalization,
//! ordering and the read-side permission policy on top so every engine component
//! sees the same `Record` shape regardless of which collection it came from.

pub mod import;
pub mod memory;
pub mod persistence;

pub use import::{documents_from_json, import_documents};
pub use memory::{FaultPlan, MemoryDocumentStore};
pub use persistence::SledDocumentStore;

use crate::error::StorageError;
use crate::normalize::normalize_document;
use crate::types::{CollectionId, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Reverse;
use std::sync::Arc;
use tracing::warn;

/// A raw stored document and its key.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub key: String,
    pub body: Value,
}

impl Document {
    pub fn new(key: impl Into<String>, body: Value) -> Self {
        Self {
            key: key.into(),
            body,
        }
    }
}

/// A normalized record together with the stored body it was read from.
///
/// Moves write `body` unchanged, so fields the engine does not model survive.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub record: Record,
    pub body: Value,
}

impl StoredRecord {
    /// The stored document, keyed by certification number.
    pub fn document(&self) -> Document {
        Document::new(self.record.cert_number.clone(), self.body.clone())
    }
}

/// Raw document backend interface.
///
/// Implementations enforce key uniqueness within a collection and per-document
/// atomicity of each `put` / `delete`.
pub trait DocumentStore: Send + Sync {
    /// All documents of a collection, in a stable key order. A collection that
    /// was never written is empty.
    fn list(&self, collection: &CollectionId) -> Result<Vec<Document>, StorageError>;

    fn get(&self, collection: &CollectionId, key: &str) -> Result<Option<Document>, StorageError>;

    /// Upsert: fully overwrites any existing document under the same key.
    fn put(&self, collection: &CollectionId, document: &Document) -> Result<(), StorageError>;

    /// Remove a document. Removing an absent key is not an error.
    fn delete(&self, collection: &CollectionId, key: &str) -> Result<(), StorageError>;

    /// Whether [`DocumentStore::transfer_atomic`] is available.
    fn supports_atomic_transfer(&self) -> bool {
        false
    }

    /// Write `document` into `to` and remove it from `from` as one transaction.
    fn transfer_atomic(
        &self,
        _from: &CollectionId,
        _to: &CollectionId,
        _document: &Document,
    ) -> Result<(), StorageError> {
        Err(StorageError::Unsupported("atomic transfer"))
    }
}

/// What a read does when the backend reports a permission failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionPolicy {
    /// An inaccessible collection reads as an empty one.
    #[default]
    TreatAsEmpty,
    /// Surface the permission error to the caller.
    Propagate,
}

/// Normalizing accessor over a [`DocumentStore`], parameterized by collection name.
///
/// Writes never degrade: a permission failure on `put` / `delete` is always an error.
#[derive(Clone)]
pub struct StoreAccessor {
    backend: Arc<dyn DocumentStore>,
    read_policy: PermissionPolicy,
}

impl StoreAccessor {
    pub fn new(backend: Arc<dyn DocumentStore>, read_policy: PermissionPolicy) -> Self {
        Self {
            backend,
            read_policy,
        }
    }

    pub fn backend(&self) -> &Arc<dyn DocumentStore> {
        &self.backend
    }

    pub fn read_policy(&self) -> PermissionPolicy {
        self.read_policy
    }

    /// Every record of `collection`, newest `last_updated` first. Records without a
    /// timestamp follow in the backend's key order.
    pub fn list_all(&self, collection: &CollectionId) -> Result<Vec<Record>, StorageError> {
        Ok(self
            .snapshot(collection)?
            .into_iter()
            .map(|stored| stored.record)
            .collect())
    }

    /// Like [`StoreAccessor::list_all`], keeping each record's stored body.
    ///
    /// A document that is not a JSON object is skipped with a warning rather than
    /// failing the whole collection.
    pub fn snapshot(&self, collection: &CollectionId) -> Result<Vec<StoredRecord>, StorageError> {
        let documents = match self.backend.list(collection) {
            Ok(documents) => documents,
            Err(e) if e.is_permission_denied() && self.read_policy == PermissionPolicy::TreatAsEmpty => {
                warn!(
                    collection = %collection,
                    error = %e,
                    "Collection not readable, treating as empty"
                );
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let mut stored = Vec::with_capacity(documents.len());
        for doc in documents {
            match normalize_document(collection, &doc.key, &doc.body) {
                Ok(record) => stored.push(StoredRecord {
                    record,
                    body: doc.body,
                }),
                Err(e) => warn!(
                    collection = %collection,
                    key = %doc.key,
                    error = %e,
                    "Skipping unreadable document"
                ),
            }
        }
        // Stable sort keeps key order among equal (and absent) timestamps.
        stored.sort_by_key(|s| Reverse(s.record.last_updated));
        Ok(stored)
    }

    /// Fetch one record; `None` when the key is absent.
    pub fn get(
        &self,
        collection: &CollectionId,
        cert_number: &str,
    ) -> Result<Option<Record>, StorageError> {
        Ok(self.fetch(collection, cert_number)?.map(|stored| stored.record))
    }

    /// Fetch one record with its stored body. A malformed document is an error here.
    pub fn fetch(
        &self,
        collection: &CollectionId,
        cert_number: &str,
    ) -> Result<Option<StoredRecord>, StorageError> {
        let document = match self.backend.get(collection, cert_number) {
            Ok(document) => document,
            Err(e) if e.is_permission_denied() && self.read_policy == PermissionPolicy::TreatAsEmpty => {
                warn!(
                    collection = %collection,
                    cert_number,
                    error = %e,
                    "Record not readable, treating as absent"
                );
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        document
            .map(|doc| {
                normalize_document(collection, &doc.key, &doc.body)
                    .map(|record| StoredRecord { record, body: doc.body })
            })
            .transpose()
    }

    /// Fetch one record, mapping absence to [`StorageError::NotFound`].
    pub fn require(
        &self,
        collection: &CollectionId,
        cert_number: &str,
    ) -> Result<Record, StorageError> {
        self.get(collection, cert_number)?
            .ok_or_else(|| StorageError::NotFound {
                collection: collection.to_string(),
                key: cert_number.to_string(),
            })
    }

    /// Full overwrite of the document's key in `collection`.
    pub fn put(&self, collection: &CollectionId, document: &Document) -> Result<(), StorageError> {
        self.backend.put(collection, document)
    }

    pub fn delete(&self, collection: &CollectionId, cert_number: &str) -> Result<(), StorageError> {
        self.backend.delete(collection, cert_number)
    }

    pub fn supports_atomic_transfer(&self) -> bool {
        self.backend.supports_atomic_transfer()
    }

    /// Move a document from `from` to `to` in one backend transaction.
    pub fn transfer_atomic(
        &self,
        from: &CollectionId,
        to: &CollectionId,
        document: &Document,
    ) -> Result<(), StorageError> {
        self.backend.transfer_atomic(from, to, document)
    }
}
