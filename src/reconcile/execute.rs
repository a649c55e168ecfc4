//! Merge Executor: bulk move of one collection into another.
//!
//! Both collections are snapshotted once up front; the run then walks the source
//! snapshot sequentially, writing each stored document into the destination
//! unchanged (full overwrite) and deleting it from the source. A failure on one record is recorded and the run
//! moves on.
//!
//! Without an atomic backend transfer, write-then-delete is two operations. If the
//! delete fails the key exists in both collections again; running the merge a second
//! time classifies it as a duplicate, rewrites the same data and retries the delete,
//! so repeated runs converge.

use crate::error::ApiError;
use crate::reconcile::plan::ensure_distinct;
use crate::store::{StoreAccessor, StoredRecord};
use crate::types::CollectionId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Progress notification, emitted once per processed record.
#[derive(Debug, Clone, Copy)]
pub struct MergeProgress<'a> {
    /// 1-based count of records processed so far; strictly increasing.
    pub current: usize,
    pub total: usize,
    pub cert_number: &'a str,
    pub is_unique: bool,
    /// Set when this record's move failed.
    pub error: Option<&'a str>,
}

/// Cooperative cancellation flag for an in-flight merge.
///
/// Checked before each record. A cancelled run keeps whatever it already moved;
/// re-running the merge picks up the rest.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A record whose move failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordError {
    pub cert_number: String,
    pub error_message: String,
}

/// Outcome of a merge run.
///
/// A non-empty `errors` list means the run completed with partial failures.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResult {
    pub total_processed: usize,
    pub uniques_moved: usize,
    pub duplicates_overwritten: usize,
    pub errors: Vec<RecordError>,
    /// True iff `errors` is empty.
    pub success: bool,
    /// The run stopped early on a [`CancelToken`].
    pub cancelled: bool,
}

type ProgressCallback<'a> = Box<dyn FnMut(&MergeProgress<'_>) + 'a>;

/// Bulk merge runner.
pub struct MergeExecutor<'a> {
    accessor: &'a StoreAccessor,
    atomic_moves: bool,
    cancel: Option<CancelToken>,
    progress: Option<ProgressCallback<'a>>,
}

impl<'a> MergeExecutor<'a> {
    pub fn new(accessor: &'a StoreAccessor) -> Self {
        Self {
            accessor,
            atomic_moves: false,
            cancel: None,
            progress: None,
        }
    }

    /// Use the backend's atomic transfer for each record when it offers one.
    pub fn atomic_moves(mut self, enabled: bool) -> Self {
        self.atomic_moves = enabled;
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Register a progress callback. A panic inside it is caught and logged.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&MergeProgress<'_>) + 'a,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Merge `source` into `dest`.
    ///
    /// Fails as a whole only when the initial snapshot reads fail.
    pub fn run(mut self, source: &CollectionId, dest: &CollectionId) -> Result<MergeResult, ApiError> {
        ensure_distinct(source, dest)?;

        let source_snapshot = self.accessor.snapshot(source)?;
        let dest_snapshot = self.accessor.list_all(dest)?;
        let dest_keys: HashSet<&str> = dest_snapshot
            .iter()
            .map(|r| r.cert_number.as_str())
            .collect();

        let total = source_snapshot.len();
        let atomic = self.atomic_moves && self.accessor.supports_atomic_transfer();
        info!(
            source = %source,
            dest = %dest,
            total,
            dest_size = dest_snapshot.len(),
            atomic,
            "Merge started"
        );

        let mut result = MergeResult::default();
        for stored in &source_snapshot {
            let record = &stored.record;
            if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                info!(
                    source = %source,
                    dest = %dest,
                    processed = result.total_processed,
                    total,
                    "Merge cancelled, leaving remaining records in place"
                );
                result.cancelled = true;
                break;
            }

            let is_unique = !dest_keys.contains(record.cert_number.as_str());
            let outcome = self.move_record(stored, source, dest, atomic);
            result.total_processed += 1;

            let error_message = match outcome {
                Ok(()) => {
                    if is_unique {
                        result.uniques_moved += 1;
                    } else {
                        result.duplicates_overwritten += 1;
                    }
                    None
                }
                Err(message) => {
                    warn!(
                        cert_number = %record.cert_number,
                        source = %source,
                        dest = %dest,
                        error = %message,
                        "Record merge failed, continuing"
                    );
                    result.errors.push(RecordError {
                        cert_number: record.cert_number.clone(),
                        error_message: message.clone(),
                    });
                    Some(message)
                }
            };

            self.report(&MergeProgress {
                current: result.total_processed,
                total,
                cert_number: &record.cert_number,
                is_unique,
                error: error_message.as_deref(),
            });
        }

        result.success = result.errors.is_empty();
        info!(
            source = %source,
            dest = %dest,
            processed = result.total_processed,
            uniques = result.uniques_moved,
            duplicates = result.duplicates_overwritten,
            errors = result.errors.len(),
            cancelled = result.cancelled,
            "Merge finished"
        );
        Ok(result)
    }

    fn move_record(
        &self,
        stored: &StoredRecord,
        source: &CollectionId,
        dest: &CollectionId,
        atomic: bool,
    ) -> Result<(), String> {
        let document = stored.document();
        if atomic {
            return self
                .accessor
                .transfer_atomic(source, dest, &document)
                .map_err(|e| format!("atomic transfer failed: {}", e));
        }
        self.accessor
            .put(dest, &document)
            .map_err(|e| format!("write to '{}' failed: {}", dest, e))?;
        self.accessor
            .delete(source, &document.key)
            .map_err(|e| format!("delete from '{}' failed after write: {}", source, e))
    }

    fn report(&mut self, progress: &MergeProgress<'_>) {
        let Some(callback) = self.progress.as_mut() else {
            return;
        };
        if catch_unwind(AssertUnwindSafe(|| callback(progress))).is_err() {
            warn!(
                cert_number = progress.cert_number,
                "Progress callback panicked, ignoring"
            );
        }
    }
}
