//! Merge Planner: read-only preview of a bulk merge.

use crate::error::ApiError;
use crate::store::StoreAccessor;
use crate::types::{CollectionId, Record};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// What merging `source_collection` into `dest_collection` would do.
///
/// `unique_to_move.len() + duplicates_to_overwrite.len() == total_in_source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergePreview {
    pub source_collection: CollectionId,
    pub dest_collection: CollectionId,
    pub total_in_source: usize,
    pub total_in_dest: usize,
    pub unique_to_move: Vec<String>,
    pub duplicates_to_overwrite: Vec<String>,
    /// Duplicates overwrite in place, so only uniques grow the destination.
    pub projected_final_count: usize,
}

/// Classify snapshot listings without touching the store.
pub fn plan_merge(
    source_collection: &CollectionId,
    dest_collection: &CollectionId,
    source: &[Record],
    dest: &[Record],
) -> MergePreview {
    let dest_keys: HashSet<&str> = dest.iter().map(|r| r.cert_number.as_str()).collect();

    let (duplicates, uniques): (Vec<&Record>, Vec<&Record>) = source
        .iter()
        .partition(|r| dest_keys.contains(r.cert_number.as_str()));

    let unique_to_move: Vec<String> = uniques.iter().map(|r| r.cert_number.clone()).collect();
    let duplicates_to_overwrite: Vec<String> =
        duplicates.iter().map(|r| r.cert_number.clone()).collect();

    MergePreview {
        source_collection: source_collection.clone(),
        dest_collection: dest_collection.clone(),
        total_in_source: source.len(),
        total_in_dest: dest.len(),
        projected_final_count: dest.len() + unique_to_move.len(),
        unique_to_move,
        duplicates_to_overwrite,
    }
}

/// Read both collections in full and preview the merge. Performs no writes.
pub fn preview_merge(
    accessor: &StoreAccessor,
    source_collection: &CollectionId,
    dest_collection: &CollectionId,
) -> Result<MergePreview, ApiError> {
    ensure_distinct(source_collection, dest_collection)?;
    let source = accessor.list_all(source_collection)?;
    let dest = accessor.list_all(dest_collection)?;
    let preview = plan_merge(source_collection, dest_collection, &source, &dest);
    debug!(
        source = %source_collection,
        dest = %dest_collection,
        unique = preview.unique_to_move.len(),
        duplicates = preview.duplicates_to_overwrite.len(),
        "Merge preview computed"
    );
    Ok(preview)
}

/// Merging a collection into itself would delete every record it moves.
pub(crate) fn ensure_distinct(
    source_collection: &CollectionId,
    dest_collection: &CollectionId,
) -> Result<(), ApiError> {
    if source_collection == dest_collection {
        return Err(ApiError::InvalidInput(format!(
            "source and destination are both '{}'",
            source_collection
        )));
    }
    Ok(())
}
