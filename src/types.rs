//! Core types shared across the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Default value for text fields missing from a stored document.
pub const UNKNOWN: &str = "Unknown";

/// Name of a keyed document collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(String);

impl CollectionId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CollectionId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for CollectionId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// The two collections the engine reconciles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionPair {
    pub primary: CollectionId,
    pub secondary: CollectionId,
}

impl CollectionPair {
    pub fn new(primary: impl Into<CollectionId>, secondary: impl Into<CollectionId>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }

    /// Resolve a user-supplied collection reference.
    ///
    /// Accepts the aliases `primary` / `secondary` as well as literal names.
    pub fn resolve(&self, reference: &str) -> CollectionId {
        match reference {
            "primary" => self.primary.clone(),
            "secondary" => self.secondary.clone(),
            other => CollectionId::new(other),
        }
    }
}

/// Certified-card metadata entry in canonical (normalized) shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub cert_number: String,
    pub card_name: String,
    pub brand: String,
    pub grade: String,
    pub total_population: u64,
    pub access_count: u64,
    pub last_updated: Option<DateTime<Utc>>,
    /// Collection this snapshot was read from. Provenance only, never persisted.
    pub origin: CollectionId,
    /// Top-level document fields the engine does not model.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl Record {
    /// A record with default field values, as the normalizer would produce for an
    /// empty document.
    pub fn new(cert_number: impl Into<String>, origin: impl Into<CollectionId>) -> Self {
        Self {
            cert_number: cert_number.into(),
            card_name: UNKNOWN.to_string(),
            brand: UNKNOWN.to_string(),
            grade: UNKNOWN.to_string(),
            total_population: 0,
            access_count: 0,
            last_updated: None,
            origin: origin.into(),
            extra: Map::new(),
        }
    }

    pub fn with_grade(mut self, grade: impl Into<String>) -> Self {
        self.grade = grade.into();
        self
    }

    pub fn with_card_name(mut self, card_name: impl Into<String>) -> Self {
        self.card_name = card_name.into();
        self
    }

    pub fn with_last_updated(mut self, last_updated: DateTime<Utc>) -> Self {
        self.last_updated = Some(last_updated);
        self
    }

    /// Same record, re-attributed to another collection.
    pub fn relocated(&self, origin: &CollectionId) -> Self {
        let mut record = self.clone();
        record.origin = origin.clone();
        record
    }
}
