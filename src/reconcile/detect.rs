//! Duplicate Detector: keys present in both collections.

use crate::reconcile::compare::{compare_records, FieldDiff};
use crate::types::Record;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A certification number present in both collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicatePair {
    pub cert_number: String,
    /// Copy from the primary collection.
    pub record_a: Record,
    /// Copy from the secondary collection.
    pub record_b: Record,
    pub conflicts: Vec<FieldDiff>,
}

impl DuplicatePair {
    /// Whether the two copies disagree on any compared field.
    pub fn is_divergent(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// Find every key present in both listings.
///
/// Indexes `secondary` by key, then scans `primary`; pairs come out in `primary`
/// order. O(n + m) time, O(m) extra space. Conflicts are left empty; see
/// [`detect_duplicates`] for the compared form.
pub fn find_duplicates(primary: &[Record], secondary: &[Record]) -> Vec<DuplicatePair> {
    let index: HashMap<&str, &Record> = secondary
        .iter()
        .map(|record| (record.cert_number.as_str(), record))
        .collect();

    primary
        .iter()
        .filter_map(|record_a| {
            index
                .get(record_a.cert_number.as_str())
                .map(|record_b| DuplicatePair {
                    cert_number: record_a.cert_number.clone(),
                    record_a: record_a.clone(),
                    record_b: (*record_b).clone(),
                    conflicts: Vec::new(),
                })
        })
        .collect()
}

/// Find duplicates and compute each pair's field-level conflicts.
pub fn detect_duplicates(primary: &[Record], secondary: &[Record]) -> Vec<DuplicatePair> {
    let mut pairs = find_duplicates(primary, secondary);
    for pair in &mut pairs {
        pair.conflicts = compare_records(&pair.record_a, &pair.record_b);
    }
    pairs
}
